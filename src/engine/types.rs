use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiag {
    pub engine_path: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine ran and exited unsuccessfully. `code` is `None` when killed by a signal.
    #[error("engine exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    Exited { code: Option<i32>, stderr: String },

    #[error("engine timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("failed to start engine {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the engine itself rejected the job, as opposed to us failing to drive it.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, EngineError::Exited { .. } | EngineError::TimedOut { .. })
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
