use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use sysinfo::System;
use tracing::warn;
use xfidelity_security::run_checked;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub platform: String,
    pub release: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub arch: String,
    pub cpus: usize,
    pub total_memory: u64,
    pub free_memory: u64,
}

impl HostInfo {
    fn collect() -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        Self {
            platform: std::env::consts::OS.to_string(),
            release: System::os_version().unwrap_or_default(),
            kind: System::name().unwrap_or_default(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: system.cpus().len(),
            total_memory: system.total_memory(),
            free_memory: system.free_memory(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub homedir: String,
    pub shell: Option<String>,
}

impl UserInfo {
    fn collect() -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        let homedir = dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let shell = std::env::var("SHELL").ok();

        Self { username, homedir, shell }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEnvelope {
    pub repo_url: String,
    pub config_server: String,
    pub host_info: HostInfo,
    pub user_info: UserInfo,
    pub start_time: i64,
}

/// `collectTelemetryData({repoPath, configServer})`. `repoUrl` is read via
/// `git config --get remote.origin.url` in `repo_path`; empty or failing
/// resolves to an empty string with a warn log, never an error.
pub async fn collect_telemetry_data(repo_path: &Path, config_server: Option<&str>) -> TelemetryEnvelope {
    TelemetryEnvelope {
        repo_url: resolve_repo_url(repo_path).await,
        config_server: config_server.map(str::to_string).unwrap_or_else(|| "none".to_string()),
        host_info: HostInfo::collect(),
        user_info: UserInfo::collect(),
        start_time: chrono::Utc::now().timestamp_millis(),
    }
}

async fn resolve_repo_url(repo_path: &Path) -> String {
    let output = match run_checked(
        "git",
        &["config", "--get", "remote.origin.url"],
        Some(repo_path),
        Duration::from_secs(5),
    )
    .await
    {
        Ok(output) => output,
        Err(e) => {
            warn!(path = %repo_path.display(), error = %e, "failed to invoke git for remote url");
            return String::new();
        }
    };

    if !output.status.success() {
        warn!(path = %repo_path.display(), status = ?output.status, "git config failed to resolve remote url");
        return String::new();
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if url.is_empty() {
        warn!(path = %repo_path.display(), "git remote.origin.url is empty");
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_repo_resolves_to_empty_repo_url() {
        let dir = tempfile::tempdir().unwrap();
        let envelope = collect_telemetry_data(dir.path(), None).await;
        assert_eq!(envelope.repo_url, "");
        assert_eq!(envelope.config_server, "none");
    }

    #[tokio::test]
    async fn config_server_is_passed_through_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let envelope = collect_telemetry_data(dir.path(), Some("https://config.example.com")).await;
        assert_eq!(envelope.config_server, "https://config.example.com");
    }

    #[test]
    fn host_info_reports_at_least_one_cpu() {
        let info = HostInfo::collect();
        assert!(info.cpus >= 1);
        assert!(!info.platform.is_empty());
    }
}
