use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_marks_saved(written: u64, skipped: u64) {
    ::metrics::counter!("marks_saved_total").increment(written);
    if skipped > 0 {
        ::metrics::counter!("marks_skipped_total").increment(skipped);
    }
}

pub(crate) fn record_export(scope: &'static str) {
    ::metrics::counter!("exam_exports_total", "scope" => scope).increment(1);
}

pub(crate) fn record_lock_transition(action: &'static str, scope: &'static str, exams: usize) {
    ::metrics::counter!(
        "exam_lock_transitions_total",
        "action" => action,
        "scope" => scope
    )
    .increment(exams as u64);
}
