use std::time::Instant;

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};
use xfidelity_engine::{Almanac, EngineError, EvalResult, RuleEngine, RunContext};
use xfidelity_schema::{
    ConditionType, ErrorLevel, FileData, RuleFailure, RuleFailureDetails, ScanResult,
    REPO_GLOBAL_CHECK,
};

use crate::dedup::DedupScope;
use crate::model::ScanRequest;
use crate::timing::TimingReport;

/// `runEngineOnFiles` (§4.I), run sequentially in file order. Iterative
/// files run first, the repo-global pseudo-file (if present) last; an
/// empty file list short-circuits without touching the engine.
pub async fn run_engine_on_files(engine: &RuleEngine, request: ScanRequest) -> Vec<ScanResult> {
    if request.file_data.is_empty() {
        return Vec::new();
    }

    let ScanRequest {
        file_data,
        archetype,
        installed_dependency_versions,
        minimum_dependency_versions,
        standard_structure,
        repo_path,
    } = request;

    let (global, iterative): (Vec<FileData>, Vec<FileData>) =
        file_data.into_iter().partition(|f| f.file_name == REPO_GLOBAL_CHECK);

    let mut timing = TimingReport::new();
    let mut results = Vec::new();

    for file in &iterative {
        let started = Instant::now();
        let display_path = display_path(&file.file_path, repo_path.as_deref());
        let context = RunContext {
            file_data: Some(file.clone()),
            archetype: archetype.clone(),
            installed_dependency_versions: installed_dependency_versions.clone(),
            minimum_dependency_versions: minimum_dependency_versions.clone(),
            standard_structure: standard_structure.clone(),
        };

        let scan_result = process_run(engine, context, &display_path, &file.file_name).await;
        timing.record(&display_path, started.elapsed());
        if let Some(scan_result) = scan_result {
            results.push(scan_result);
        }
    }

    if let Some(_global_file) = global.into_iter().next() {
        let started = Instant::now();
        let context = RunContext {
            file_data: None,
            archetype,
            installed_dependency_versions,
            minimum_dependency_versions,
            standard_structure,
        };
        let scan_result = process_run(engine, context, REPO_GLOBAL_CHECK, REPO_GLOBAL_CHECK).await;
        timing.record(REPO_GLOBAL_CHECK, started.elapsed());
        if let Some(scan_result) = scan_result {
            results.push(scan_result);
        }
    }

    timing.log_slowest();
    results
}

/// Same contract as [`run_engine_on_files`], but iterative files run on
/// rayon's pool (one worker per file, mirroring `Linter::lint_files`'s
/// per-file isolation) while the repo-global pass still runs afterward on
/// the caller's thread so every iterative result is available to it.
pub fn run_engine_on_files_parallel(engine: &RuleEngine, request: ScanRequest) -> Vec<ScanResult> {
    if request.file_data.is_empty() {
        return Vec::new();
    }

    let ScanRequest {
        file_data,
        archetype,
        installed_dependency_versions,
        minimum_dependency_versions,
        standard_structure,
        repo_path,
    } = request;

    let (global, iterative): (Vec<FileData>, Vec<FileData>) =
        file_data.into_iter().partition(|f| f.file_name == REPO_GLOBAL_CHECK);

    let mut timing = TimingReport::new();

    let outcomes: Vec<(String, std::time::Duration, Option<ScanResult>)> = iterative
        .par_iter()
        .map(|file| {
            let started = Instant::now();
            let display_path = display_path(&file.file_path, repo_path.as_deref());
            let context = RunContext {
                file_data: Some(file.clone()),
                archetype: archetype.clone(),
                installed_dependency_versions: installed_dependency_versions.clone(),
                minimum_dependency_versions: minimum_dependency_versions.clone(),
                standard_structure: standard_structure.clone(),
            };
            let scan_result = block_on(process_run(engine, context, &display_path, &file.file_name));
            (display_path, started.elapsed(), scan_result)
        })
        .collect();

    let mut results = Vec::new();
    for (path, elapsed, scan_result) in outcomes {
        timing.record(&path, elapsed);
        if let Some(scan_result) = scan_result {
            results.push(scan_result);
        }
    }

    if let Some(_global_file) = global.into_iter().next() {
        let started = Instant::now();
        let context = RunContext {
            file_data: None,
            archetype,
            installed_dependency_versions,
            minimum_dependency_versions,
            standard_structure,
        };
        let scan_result = block_on(process_run(engine, context, REPO_GLOBAL_CHECK, REPO_GLOBAL_CHECK));
        timing.record(REPO_GLOBAL_CHECK, started.elapsed());
        if let Some(scan_result) = scan_result {
            results.push(scan_result);
        }
    }

    timing.log_slowest();
    results
}

/// Bridges an async call onto a rayon worker thread, which is not itself
/// a tokio thread: reuses the ambient runtime if one is driving this call
/// (via `block_in_place`, so it doesn't starve that runtime's pool), or
/// spins up a throwaway one otherwise.
fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(fut)),
        Err(_) => tokio::runtime::Runtime::new()
            .expect("failed to start a runtime for a rayon worker")
            .block_on(fut),
    }
}

async fn process_run(
    engine: &RuleEngine,
    context: RunContext,
    file_path: &str,
    file_name: &str,
) -> Option<ScanResult> {
    let run = match engine.run(context).await {
        Ok(run) => run,
        Err(e) => {
            warn!(file = %file_path, error = %e, "engine failed to process file");
            return Some(ScanResult {
                file_path: file_path.to_string(),
                errors: vec![engine_error_failure(&e, file_path, file_name)],
            });
        }
    };

    let mut dedup = DedupScope::new();
    let mut errors = Vec::new();
    for result in &run.results {
        let Some(level) = parse_level(&result.event.event_type) else {
            warn!(
                rule = %result.name,
                file = %file_path,
                event_type = %result.event.event_type,
                "rule fired with an unrecognized event type, dropping result"
            );
            continue;
        };

        let message = event_message(result);
        if !dedup.insert(&result.name, &result.event.event_type, message.as_deref()) {
            debug!(rule = %result.name, file = %file_path, "duplicate rule failure dropped");
            continue;
        }
        errors.push(build_rule_failure(result, level, &run.almanac, file_path, file_name).await);
    }

    if errors.is_empty() {
        None
    } else {
        Some(ScanResult { file_path: file_path.to_string(), errors })
    }
}

fn event_message(result: &EvalResult) -> Option<String> {
    result
        .event
        .params
        .as_ref()
        .and_then(|p| p.get("message"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

async fn build_rule_failure(
    result: &EvalResult,
    level: ErrorLevel,
    almanac: &Almanac,
    file_path: &str,
    file_name: &str,
) -> RuleFailure {
    let (result_fact, details) = resolve_event_details(result.event.params.as_ref(), almanac).await;
    let message = event_message(result).unwrap_or_else(|| result.rule_description.clone());

    RuleFailure {
        rule_failure: result.name.clone(),
        level,
        details: RuleFailureDetails {
            message,
            condition_details: result.condition_details.clone(),
            all_conditions: result.all_conditions.clone(),
            condition_type: result.condition_type,
            rule_description: result.rule_description.clone(),
            recommendations: result.recommendations.clone(),
            file_path: file_path.to_string(),
            file_name: file_name.to_string(),
            result_fact,
            details,
        },
    }
}

/// Parses `event.type` against the spec's ordered severity list
/// (`trace, debug, info, warning, error, fatality`); `None` for
/// anything else, so the caller can reject the result rather than
/// silently mislabeling its severity.
fn parse_level(event_type: &str) -> Option<ErrorLevel> {
    let level: ErrorLevel = serde_json::from_value(Value::String(event_type.to_string())).ok()?;
    // `exempt` is an internal relabeling outcome (§4.B), never a rule-declared severity.
    (level != ErrorLevel::Exempt).then_some(level)
}

/// `event.params.details`, when it is a single-key `{"fact": "<name>"}`
/// object, names a fact to resolve against the same almanac the run used
/// and report back as `resultFact`/`details` (§4.H). Anything else in
/// `details` passes through unresolved.
async fn resolve_event_details(
    params: Option<&Value>,
    almanac: &Almanac,
) -> (Option<String>, Option<Value>) {
    let Some(details) = params.and_then(|p| p.get("details")) else {
        return (None, None);
    };

    if let Value::Object(map) = details {
        if map.len() == 1 {
            if let Some(Value::String(fact_name)) = map.get("fact") {
                return match almanac.fact_value(fact_name, None).await {
                    Ok(resolved) => (Some(fact_name.clone()), Some(resolved)),
                    Err(_) => (None, Some(details.clone())),
                };
            }
        }
    }

    (None, Some(details.clone()))
}

fn engine_error_failure(err: &EngineError, file_path: &str, file_name: &str) -> RuleFailure {
    RuleFailure {
        rule_failure: "engine-error".to_string(),
        level: ErrorLevel::Error,
        details: RuleFailureDetails {
            message: format!("Engine failed to process file: {err}"),
            condition_details: None,
            all_conditions: Vec::new(),
            condition_type: ConditionType::All,
            rule_description: "No description available".to_string(),
            recommendations: None,
            file_path: file_path.to_string(),
            file_name: file_name.to_string(),
            result_fact: None,
            details: None,
        },
    }
}

fn display_path(file_path: &std::path::Path, repo_path: Option<&std::path::Path>) -> String {
    match repo_path.and_then(|root| file_path.strip_prefix(root).ok()) {
        Some(relative) => relative.to_string_lossy().into_owned(),
        None => file_path.to_string_lossy().into_owned(),
    }
}
