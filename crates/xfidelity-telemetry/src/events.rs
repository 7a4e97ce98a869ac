use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Notable events worth reporting outside the scan's own log stream.
/// `ExemptionAllowed` fires when `isExempt` finds a covering, unexpired
/// exemption (§4.B); `PluginExecutionFailed` fires when a fact/operator
/// call to a subprocess plugin errors out.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TelemetryEvent {
    ExemptionAllowed {
        repo_url: String,
        rule: String,
        expiration_date: DateTime<Utc>,
        reason: String,
    },
    PluginExecutionFailed {
        plugin: String,
        message: String,
    },
}

/// Where `TelemetryEvent`s go. Kept as a trait so a host application can
/// wire in a real collector; `TracingSink` (the default) and `NullSink`
/// (for tests) are the only implementations this crate ships.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::ExemptionAllowed { repo_url, rule, expiration_date, reason } => {
                info!(
                    event = "exemptionAllowed",
                    repo_url = %repo_url,
                    rule = %rule,
                    expiration_date = %expiration_date,
                    reason = %reason,
                    "exemption allowed"
                );
            }
            TelemetryEvent::PluginExecutionFailed { plugin, message } => {
                warn!(event = "pluginExecutionFailed", plugin = %plugin, message = %message, "plugin execution failed");
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&self, _event: TelemetryEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_does_not_panic() {
        let sink = NullSink;
        sink.record(TelemetryEvent::PluginExecutionFailed {
            plugin: "xfi-plugin-test".into(),
            message: "boom".into(),
        });
    }

    #[test]
    fn tracing_sink_records_without_panicking() {
        let sink = TracingSink;
        sink.record(TelemetryEvent::ExemptionAllowed {
            repo_url: "https://github.com/o/p".into(),
            rule: "r".into(),
            expiration_date: "2099-01-01T00:00:00Z".parse().unwrap(),
            reason: "reason".into(),
        });
    }
}
