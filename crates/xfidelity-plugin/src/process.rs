use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::PluginError;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Manifest,
    Fact {
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<&'a serde_json::Value>,
    },
    Operator {
        name: &'a str,
        fact_value: &'a serde_json::Value,
        condition_value: &'a serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// A spawned out-of-tree plugin executable, driven over a newline-
/// delimited JSON request/response protocol on stdin/stdout. One
/// in-flight call at a time; the mutex serializes callers rather than
/// letting them race on the shared pipe.
pub struct ProcessPluginHandle {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    timeout: Duration,
}

impl ProcessPluginHandle {
    pub fn spawn(
        executable: &Path,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<Self, PluginError> {
        let mut command = tokio::process::Command::new(executable);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| {
            PluginError::load(format!("plugin '{}' did not expose stdin", executable.display()))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            PluginError::load(format!("plugin '{}' did not expose stdout", executable.display()))
        })?;

        Ok(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch_manifest(&self) -> Result<serde_json::Value, PluginError> {
        let response = self.call(&Request::Manifest).await?;
        Ok(response)
    }

    pub async fn call_fact(
        &self,
        name: &str,
        params: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, PluginError> {
        self.call(&Request::Fact { name, params }).await
    }

    pub async fn call_operator(
        &self,
        name: &str,
        fact_value: &serde_json::Value,
        condition_value: &serde_json::Value,
    ) -> Result<bool, PluginError> {
        let value = self
            .call(&Request::Operator {
                name,
                fact_value,
                condition_value,
            })
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn call(&self, request: &Request<'_>) -> Result<serde_json::Value, PluginError> {
        let body = serde_json::to_string(request)?;

        let send_and_receive = async {
            {
                let mut stdin = self.stdin.lock().await;
                stdin.write_all(body.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await?;
            }

            let mut line = String::new();
            let mut stdout = self.stdout.lock().await;
            let bytes_read = stdout.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(PluginError::call("plugin closed stdout unexpectedly"));
            }
            Ok::<_, PluginError>(line)
        };

        let timeout_ms = self.timeout.as_millis() as u64;
        let line = match tokio::time::timeout(self.timeout, send_and_receive).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_ms, "plugin call exceeded timeout");
                return Err(PluginError::Timeout(timeout_ms));
            }
        };

        let response: Response = serde_json::from_str(line.trim())
            .map_err(|e| PluginError::call(format!("malformed plugin response: {e}")))?;

        if response.ok {
            Ok(response.value)
        } else {
            Err(PluginError::call(
                response.error.unwrap_or_else(|| "plugin reported failure with no message".to_string()),
            ))
        }
    }

    pub async fn shutdown(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "failed to signal plugin subprocess shutdown");
        }
    }
}
