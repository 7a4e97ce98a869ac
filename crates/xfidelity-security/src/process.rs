use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::error::SecurityError;

/// Program basenames this host is willing to spawn at all. Anything else
/// is rejected before `Command::new` is ever called.
const ALLOWED_PROGRAMS: &[&str] = &["git"];

/// Git subcommands the config-sync and telemetry boundaries are allowed to
/// invoke. Anything else (`-c`, `--upload-pack`, arbitrary other
/// subcommands) is rejected rather than merely scrubbed.
const ALLOWED_SUBCOMMANDS: &[&str] = &["clone", "fetch", "checkout", "pull", "config", "--version"];

/// Global flags permitted before the subcommand token. `-C <dir>` is the
/// only one the config-sync boundary needs (it runs `pull` against an
/// existing checkout without a `cd`).
const ALLOWED_GLOBAL_FLAGS: &[&str] = &["-C"];

/// Flags permitted anywhere after the subcommand. Any other token starting
/// with `-` is rejected, which also blocks argument injection where a
/// server-controlled value (branch, repo URL) is crafted to look like a
/// flag instead of a positional argument.
const ALLOWED_FLAGS: &[&str] = &["--branch", "--depth", "--get"];

/// Longest argument this gate accepts. Generous enough for any real repo
/// URL, branch name, or filesystem path; anything longer is almost
/// certainly not a value this boundary was meant to carry.
const MAX_ARG_LENGTH: usize = 4096;

fn validate_program(program: &str) -> Result<(), SecurityError> {
    let basename = Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program);
    if ALLOWED_PROGRAMS.contains(&basename) {
        Ok(())
    } else {
        Err(SecurityError::CommandNotAllowed(program.to_string()))
    }
}

/// Characters a subprocess argument may contain. This is an allowlist, not
/// a denylist: anything not explicitly safe for a path, URL, or git ref is
/// rejected, rather than trying to enumerate every dangerous character.
fn is_safe_arg_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '@' | '=')
}

fn validate_flag(arg: &str) -> Result<(), SecurityError> {
    if ALLOWED_GLOBAL_FLAGS.contains(&arg) || ALLOWED_FLAGS.contains(&arg) {
        Ok(())
    } else {
        Err(SecurityError::ArgumentRejected(arg.to_string()))
    }
}

/// Validates a non-flag (positional) argument: safe charset, no parent-dir
/// or home-dir escapes, bounded length, and crucially not starting with
/// `-` so it can never be mistaken by git for a flag.
fn validate_positional(arg: &str) -> Result<(), SecurityError> {
    if arg.is_empty() || arg.len() > MAX_ARG_LENGTH {
        return Err(SecurityError::ArgumentRejected(arg.to_string()));
    }
    if arg.starts_with('-') {
        return Err(SecurityError::ArgumentRejected(arg.to_string()));
    }
    if arg.contains("..") || arg.contains('~') {
        return Err(SecurityError::ArgumentRejected(arg.to_string()));
    }
    if !arg.chars().all(is_safe_arg_char) {
        return Err(SecurityError::ArgumentRejected(arg.to_string()));
    }
    Ok(())
}

/// Validates a full argument list against the subcommand allowlist: an
/// optional `-C <dir>` global flag, then an allowlisted subcommand, then
/// any mix of allowlisted flags and safe positional arguments.
fn validate_args<'a, I: IntoIterator<Item = &'a str>>(args: I) -> Result<(), SecurityError> {
    let mut iter = args.into_iter();

    let mut token = iter
        .next()
        .ok_or_else(|| SecurityError::ArgumentRejected("missing subcommand".to_string()))?;
    if token == "-C" {
        let dir = iter
            .next()
            .ok_or_else(|| SecurityError::ArgumentRejected("-C requires a directory".to_string()))?;
        validate_positional(dir)?;
        token = iter
            .next()
            .ok_or_else(|| SecurityError::ArgumentRejected("missing subcommand".to_string()))?;
    }

    if !ALLOWED_SUBCOMMANDS.contains(&token) {
        return Err(SecurityError::ArgumentRejected(token.to_string()));
    }

    for arg in iter {
        if arg.starts_with('-') {
            validate_flag(arg)?;
        } else {
            validate_positional(arg)?;
        }
    }
    Ok(())
}

/// Runs an allowlisted command with a hard wall-clock timeout, killing
/// the child if it overruns. Used both by the archetype-config clone
/// boundary (`git`) and by external-plugin subprocess launches.
pub async fn run_checked(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<std::process::Output, SecurityError> {
    if let Err(e) = validate_program(program) {
        warn!(program, error = %e, "denied subprocess: program not allowlisted");
        return Err(e);
    }
    if let Err(e) = validate_args(args.iter().copied()) {
        warn!(program, ?args, error = %e, "denied subprocess: argument rejected");
        return Err(e);
    }

    let mut command = tokio::process::Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.kill_on_drop(true);

    let timeout_ms = timeout.as_millis() as u64;
    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(SecurityError::Spawn(e)),
        Err(_) => {
            warn!(program, timeout_ms, "subprocess exceeded timeout, killed");
            Err(SecurityError::Timeout(timeout_ms))
        }
    }
}
