//! Prometheus metrics for the manager
//!
//! Exposed on `GET /metrics`.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// Counter: worker registrations
    pub static ref WORKER_REGISTRATIONS: CounterVec = register_counter_vec!(
        "mirrorfleet_worker_registrations_total",
        "Worker registrations by outcome",
        &["outcome"]
    )
    .expect("Failed to create worker_registrations metric");

    /// Counter: status updates by reported status
    pub static ref STATUS_UPDATES: CounterVec = register_counter_vec!(
        "mirrorfleet_status_updates_total",
        "Mirror status updates by reported status",
        &["status"]
    )
    .expect("Failed to create status_updates metric");

    /// Counter: operator commands by outcome
    pub static ref COMMANDS: CounterVec = register_counter_vec!(
        "mirrorfleet_commands_total",
        "Operator commands by verb and outcome",
        &["cmd", "outcome"]
    )
    .expect("Failed to create commands metric");

    /// Counter: storage backend failures by action
    pub static ref BACKEND_ERRORS: CounterVec = register_counter_vec!(
        "mirrorfleet_backend_errors_total",
        "Storage backend failures by operation",
        &["operation"]
    )
    .expect("Failed to create backend_errors metric");
}

/// Record a worker registration
pub fn record_registration(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    WORKER_REGISTRATIONS.with_label_values(&[outcome]).inc();
}

/// Record an accepted status update
pub fn record_status_update(status: &str) {
    STATUS_UPDATES.with_label_values(&[status]).inc();
}

/// Record a command outcome (accepted, rejected, delivered, failed)
pub fn record_command(cmd: &str, outcome: &str) {
    COMMANDS.with_label_values(&[cmd, outcome]).inc();
}

/// Record a storage backend failure
pub fn record_backend_error(operation: &str) {
    BACKEND_ERRORS.with_label_values(&[operation]).inc();
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recorded_and_encoded() {
        record_registration(true);
        record_status_update("success");
        record_command("start", "accepted");
        record_backend_error("list_workers");

        let output = encode_metrics();
        assert!(output.contains("mirrorfleet_worker_registrations_total"));
        assert!(output.contains("mirrorfleet_status_updates_total"));
        assert!(output.contains("mirrorfleet_commands_total"));
        assert!(output.contains("mirrorfleet_backend_errors_total"));
    }
}
