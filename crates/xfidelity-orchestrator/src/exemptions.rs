use xfidelity_exemptions::{ExemptionDecision, ExemptionStore};
use xfidelity_schema::{ErrorLevel, ScanResult};
use xfidelity_telemetry::{TelemetryEvent, TelemetrySink};

/// Walks every `RuleFailure` in `results` and overrides `level` to
/// `Exempt` for any that a covering, unexpired exemption matches (§4.B),
/// recording an `exemptionAllowed` telemetry event on each match. A
/// separate pass from `run_engine_on_files` because only the caller
/// (the CLI, typically) knows `repo_url`.
pub fn apply_exemptions(
    results: &mut [ScanResult],
    exemptions: &ExemptionStore,
    repo_url: &str,
    telemetry: &dyn TelemetrySink,
) {
    for scan_result in results.iter_mut() {
        for failure in scan_result.errors.iter_mut() {
            if let ExemptionDecision::Exempt(exemption) = exemptions.is_exempt(repo_url, &failure.rule_failure) {
                telemetry.record(TelemetryEvent::ExemptionAllowed {
                    repo_url: repo_url.to_string(),
                    rule: failure.rule_failure.clone(),
                    expiration_date: exemption.expiration_date,
                    reason: exemption.reason.clone(),
                });
                failure.level = ErrorLevel::Exempt;
            }
        }
    }
}
