use std::io::Write;
use std::{fs, path::Path, path::PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

const SECRET_FILE_NAME: &str = ".secret_key";

/// Returns the persisted signing secret, creating one on first start.
///
/// Tokens are minted by the identity service that shares this key, so a generated key is only
/// useful for local development where both run from the same checkout.
pub(super) fn load_or_create_secret_key() -> String {
    let path = secret_file_path();

    if let Some(existing) = read_secret(&path) {
        return existing;
    }

    let new_key = generate_secret_key();
    match persist_secret(&path, &new_key) {
        Ok(()) => {
            tracing::warn!(path = %path.display(), "SECRET_KEY not set; generated a local key");
            new_key
        }
        // Another process won the race; use its key.
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            read_secret(&path).unwrap_or(new_key)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to persist generated secret key; tokens will not survive a restart"
            );
            new_key
        }
    }
}

fn read_secret(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn persist_secret(path: &Path, key: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(key.as_bytes())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn secret_file_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(SECRET_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_url_safe_and_distinct() {
        let first = generate_secret_key();
        let second = generate_secret_key();
        assert_ne!(first, second);
        assert_eq!(first.len(), 86);
        assert!(first.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn read_secret_ignores_blank_files() {
        let dir = std::env::temp_dir().join(format!("marksheet-secret-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("blank");
        fs::write(&path, "  \n").expect("write blank");
        assert_eq!(read_secret(&path), None);

        fs::write(&path, " abc \n").expect("write key");
        assert_eq!(read_secret(&path).as_deref(), Some("abc"));
        let _ = fs::remove_dir_all(&dir);
    }
}
