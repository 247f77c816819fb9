#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = marksheet::run().await {
        eprintln!("marksheet fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
