//! Subprocess-backed executor.
//!
//! One gateway process per call: the request document goes to stdin, one
//! reply document comes back on stdout, and the process is killed if the
//! call is dropped (for example by a per-attempt timeout).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::StepExecutor;
use crate::errors::{ErrorCode, StepError};
use crate::steps::StepRequest;

/// How to launch the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Program to run.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl GatewayConfig {
    /// Creates a config for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// The gateway's reply document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GatewayReply {
    Ok(serde_json::Value),
    Error { code: String, message: String },
}

/// Executor that shells out to the gateway.
#[derive(Debug, Clone)]
pub struct GatewayExecutor {
    config: GatewayConfig,
}

impl GatewayExecutor {
    /// Creates an executor from its launch config.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// The launch config.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.config.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

/// Decodes the gateway's stdout into a record or a step error.
fn parse_reply(stdout: &[u8]) -> Result<serde_json::Value, StepError> {
    let reply: GatewayReply = serde_json::from_slice(stdout)
        .map_err(|e| StepError::schema_validation(format!("unreadable gateway reply: {e}")))?;
    match reply {
        GatewayReply::Ok(value) => Ok(value),
        GatewayReply::Error { code, message } => Err(StepError::new(ErrorCode::parse(&code), message)),
    }
}

#[async_trait]
impl StepExecutor for GatewayExecutor {
    async fn execute(&self, request: &StepRequest) -> Result<serde_json::Value, StepError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| StepError::schema_validation(format!("unencodable request: {e}")))?;

        let mut child = self.command().spawn().map_err(|e| {
            StepError::connection(format!("failed to start gateway '{}': {e}", self.config.program))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| StepError::connection(format!("failed to write request: {e}")))?;
            // Closing stdin signals end of request.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| StepError::connection(format!("gateway session lost: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StepError::connection(format!(
                "gateway exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::trace!(step = %request.name(), bytes = output.stdout.len(), "Gateway replied");
        parse_reply(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_reply() {
        let value = parse_reply(br#"{"ok": {"id": "HGNC:11998"}}"#).unwrap();
        assert_eq!(value["id"], "HGNC:11998");
    }

    #[test]
    fn test_parse_error_reply_keeps_code() {
        let err = parse_reply(br#"{"error": {"code": "ENTITY_NOT_FOUND", "message": "no record"}}"#)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert_eq!(err.message, "no record");
    }

    #[test]
    fn test_parse_garbage_is_schema_validation() {
        let err = parse_reply(b"Traceback (most recent call last)").unwrap_err();
        assert_eq!(err.code, ErrorCode::SchemaValidation);
    }

    #[test]
    fn test_config_builders() {
        let config = GatewayConfig::new("uv")
            .with_arg("run")
            .with_arg("gateway")
            .with_cwd("/srv/gateway")
            .with_env("LOG_LEVEL", "warn");
        assert_eq!(config.args, vec!["run", "gateway"]);
        assert_eq!(config.cwd.as_deref(), Some(std::path::Path::new("/srv/gateway")));
        assert_eq!(config.env.get("LOG_LEVEL").map(String::as_str), Some("warn"));
    }

    #[tokio::test]
    async fn test_missing_program_is_connection_error() {
        let executor = GatewayExecutor::new(GatewayConfig::new("/nonexistent/phaseflow-gateway"));
        let request = StepRequest::ResolveEntity {
            symbol: "TP53".to_string(),
        };
        let err = executor.execute(&request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Connection);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_round_trip_through_shell_gateway() {
        let config = GatewayConfig::new("sh")
            .with_arg("-c")
            .with_arg(r#"cat > /dev/null; echo '{"ok": [{"id": "CHEMBL:185"}]}'"#);
        let executor = GatewayExecutor::new(config);
        let request = StepRequest::FindDrugs {
            target_name: "thymidylate synthase".to_string(),
        };
        let value = executor.execute(&request).await.unwrap();
        assert_eq!(value[0]["id"], "CHEMBL:185");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_connection_error() {
        let config = GatewayConfig::new("sh").with_arg("-c").with_arg("cat > /dev/null; echo boom >&2; exit 3");
        let executor = GatewayExecutor::new(config);
        let request = StepRequest::ResolveEntity {
            symbol: "TP53".to_string(),
        };
        let err = executor.execute(&request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Connection);
        assert!(err.message.contains("boom"));
    }
}
