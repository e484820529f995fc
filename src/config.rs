use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Configured output directory override, if any.
    pub fn out_dir(&self) -> Option<PathBuf> {
        if self.output.out_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.output.out_dir))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    /// Explicit engine binary; `auto` (or empty) runs discovery.
    pub soffice_path: String,
    #[serde(default)]
    pub search_roots: Vec<String>,
    pub timeout_seconds: u64,
    pub capture_stderr: bool,
}
impl Default for Engine {
    fn default() -> Self {
        Self {
            soffice_path: "auto".into(),
            search_roots: Vec::new(),
            timeout_seconds: 300,
            capture_stderr: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub out_dir: String,
    pub overwrite: bool,
    pub stage_in_temp_dir: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            out_dir: "".into(),
            overwrite: true,
            stage_in_temp_dir: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
