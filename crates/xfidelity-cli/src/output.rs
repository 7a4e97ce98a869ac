use xfidelity_schema::{ErrorLevel, ScanResult};

pub fn render(results: &[ScanResult], format: &str) -> String {
    match format {
        "json" => serde_json::to_string_pretty(results).expect("ScanResult always serializes"),
        _ => render_text(results),
    }
}

fn render_text(results: &[ScanResult]) -> String {
    let mut out = String::new();
    for result in results {
        for failure in &result.errors {
            out.push_str(&format!(
                "[{}] {} ({}): {}\n",
                level_label(failure.level),
                result.file_path,
                failure.rule_failure,
                failure.details.message
            ));
        }
    }
    out
}

fn level_label(level: ErrorLevel) -> &'static str {
    match level {
        ErrorLevel::Trace => "trace",
        ErrorLevel::Debug => "debug",
        ErrorLevel::Info => "info",
        ErrorLevel::Warning => "warning",
        ErrorLevel::Error => "error",
        ErrorLevel::Fatality => "fatality",
        ErrorLevel::Exempt => "exempt",
    }
}

/// Whether any failure reached at least `warning` severity (§6's
/// exit-code mapping: `1` when findings of severity ≥ `warning` exist).
pub fn has_reportable_findings(results: &[ScanResult]) -> bool {
    results
        .iter()
        .flat_map(|r| &r.errors)
        .any(|f| f.level >= ErrorLevel::Warning && f.level != ErrorLevel::Exempt)
}
