//! Host/user/repo descriptor envelope (`collectTelemetryData`) and a
//! sink for notable scan events (`exemptionAllowed`, plugin execution
//! failures).

mod envelope;
mod events;

pub use envelope::{collect_telemetry_data, HostInfo, TelemetryEnvelope, UserInfo};
pub use events::{NullSink, TelemetryEvent, TelemetrySink, TracingSink};
