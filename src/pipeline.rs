use crate::{
    config::Config,
    engine::{Engine, EngineError},
    formats::{self, DocumentKind},
    util::{ensure_dir, replace_file},
};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Success,
    MissingSource,
    UnsupportedFormat,
    EngineFailure,
    EngineNotFound,
    OtherError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: Option<DocumentKind>,
}

impl ConversionRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let kind = formats::classify(&source);
        Self {
            source,
            destination: destination.into(),
            kind,
        }
    }

    /// Request with the default destination for `source`.
    pub fn for_source(source: impl Into<PathBuf>, out_dir: Option<&Path>) -> Self {
        let source = source.into();
        let destination = formats::default_destination(&source, out_dir);
        Self::new(source, destination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: ConversionStatus,
    pub message: String,
    /// Final PDF location; set only on success.
    pub output: Option<PathBuf>,
    pub elapsed_ms: u64,
}

impl ConversionResult {
    fn new(req: &ConversionRequest, status: ConversionStatus, message: String) -> Self {
        Self {
            source: req.source.clone(),
            destination: req.destination.clone(),
            status,
            message,
            output: None,
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }
}

enum ItemError {
    Engine(EngineError),
    Other(anyhow::Error),
}

impl From<EngineError> for ItemError {
    fn from(err: EngineError) -> Self {
        ItemError::Engine(err)
    }
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        ItemError::Other(err)
    }
}

pub struct Pipeline<E: Engine> {
    cfg: Config,
    engine: E,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(cfg: &Config, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            engine,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn convert(&self, source: &Path, destination: &Path) -> ConversionResult {
        self.convert_request(&ConversionRequest::new(source, destination))
    }

    /// Converts every request in order; a failed item never stops the ones after it.
    pub fn convert_all(&self, requests: &[ConversionRequest]) -> Vec<ConversionResult> {
        requests.iter().map(|r| self.convert_request(r)).collect()
    }

    pub fn convert_request(&self, req: &ConversionRequest) -> ConversionResult {
        if let Some(rejected) = precheck(&self.cfg, req) {
            return rejected;
        }

        let started = Instant::now();
        let mut result = match self.produce(req) {
            Ok(output) => {
                info!(
                    "converted {} -> {}",
                    req.source.display(),
                    output.display()
                );
                let mut r = ConversionResult::new(
                    req,
                    ConversionStatus::Success,
                    format!("{} -> {}", display_name(&req.source), display_name(&output)),
                );
                r.output = Some(output);
                r
            }
            Err(ItemError::Engine(err)) if err.is_engine_failure() => {
                warn!("engine failed on {}: {err}", req.source.display());
                ConversionResult::new(
                    req,
                    ConversionStatus::EngineFailure,
                    format!("{}: engine failed to convert ({err})", display_name(&req.source)),
                )
            }
            Err(ItemError::Engine(err)) => {
                warn!("conversion error on {}: {err}", req.source.display());
                ConversionResult::new(
                    req,
                    ConversionStatus::OtherError,
                    format!("{}: {err}", display_name(&req.source)),
                )
            }
            Err(ItemError::Other(err)) => {
                warn!("conversion error on {}: {err:#}", req.source.display());
                ConversionResult::new(
                    req,
                    ConversionStatus::OtherError,
                    format!("{}: {err:#}", display_name(&req.source)),
                )
            }
        };
        result.elapsed_ms = started.elapsed().as_millis() as u64;
        result
    }

    fn produce(&self, req: &ConversionRequest) -> Result<PathBuf, ItemError> {
        if req.destination.file_name().is_none() {
            let err = anyhow!("destination has no file name: {}", req.destination.display());
            return Err(err.into());
        }
        let produced_name = formats::engine_output_name(&req.source)
            .ok_or_else(|| anyhow!("source has no file name: {}", req.source.display()))?;

        let out_dir = formats::output_dir_of(&req.destination);
        ensure_dir(&out_dir)?;

        if self.cfg.output.stage_in_temp_dir {
            let staging = tempfile::Builder::new()
                .prefix(".office-pdf-")
                .tempdir_in(&out_dir)
                .with_context(|| format!("creating staging dir in {}", out_dir.display()))?;
            self.engine.convert_to_pdf(&req.source, staging.path())?;
            let produced = staging.path().join(&produced_name);
            expect_produced(&produced)?;
            replace_file(&produced, &req.destination)?;
        } else {
            self.engine.convert_to_pdf(&req.source, &out_dir)?;
            let produced = req.destination.with_file_name(&produced_name);
            expect_produced(&produced)?;
            if produced != req.destination {
                replace_file(&produced, &req.destination)?;
            }
        }

        Ok(req.destination.clone())
    }
}

/// Checks that reject an item without touching the engine.
fn precheck(cfg: &Config, req: &ConversionRequest) -> Option<ConversionResult> {
    if !req.source.exists() {
        warn!("missing source: {}", req.source.display());
        return Some(ConversionResult::new(
            req,
            ConversionStatus::MissingSource,
            format!("missing: {}", req.source.display()),
        ));
    }
    if req.kind.is_none() {
        info!("skipping unsupported file: {}", req.source.display());
        return Some(ConversionResult::new(
            req,
            ConversionStatus::UnsupportedFormat,
            format!("unsupported: {}", display_name(&req.source)),
        ));
    }
    if is_same_file(&req.source, &req.destination) {
        warn!(
            "destination is the source itself: {}",
            req.destination.display()
        );
        return Some(ConversionResult::new(
            req,
            ConversionStatus::OtherError,
            format!("destination would overwrite source: {}", req.destination.display()),
        ));
    }
    if !cfg.output.overwrite && req.destination.exists() {
        warn!(
            "destination exists and overwrite=false: {}",
            req.destination.display()
        );
        return Some(ConversionResult::new(
            req,
            ConversionStatus::OtherError,
            format!("destination exists: {}", req.destination.display()),
        ));
    }
    None
}

/// True when `dest` names the existing file `source`, through any spelling
/// of the path. A destination whose parent does not exist yet cannot match.
fn is_same_file(source: &Path, dest: &Path) -> bool {
    let Ok(source) = source.canonicalize() else {
        return false;
    };
    if let Ok(dest) = dest.canonicalize() {
        return dest == source;
    }
    let Some(name) = dest.file_name() else {
        return false;
    };
    formats::output_dir_of(dest)
        .canonicalize()
        .map(|parent| parent.join(name) == source)
        .unwrap_or(false)
}

fn expect_produced(produced: &Path) -> anyhow::Result<()> {
    if produced.is_file() {
        Ok(())
    } else {
        Err(anyhow!(
            "engine reported success but produced no output at {}",
            produced.display()
        ))
    }
}

fn display_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}

/// Batch entry point for front ends: one result per source, in order.
pub fn convert_batch<E: Engine>(
    cfg: &Config,
    engine: Option<E>,
    sources: &[PathBuf],
    out_dir: Option<&Path>,
) -> Vec<ConversionResult> {
    let requests: Vec<ConversionRequest> = sources
        .iter()
        .map(|s| ConversionRequest::for_source(s, out_dir))
        .collect();
    convert_requests(cfg, engine, &requests)
}

/// Runs prepared requests.
///
/// Without an engine every item still gets a terminal result: the usual
/// input checks apply, and items that pass them report `EngineNotFound`.
pub fn convert_requests<E: Engine>(
    cfg: &Config,
    engine: Option<E>,
    requests: &[ConversionRequest],
) -> Vec<ConversionResult> {
    match engine {
        Some(engine) => Pipeline::new(cfg, engine).convert_all(requests),
        None => {
            error!("LibreOffice (soffice) not found; install it or bundle it under tools/");
            requests
                .iter()
                .map(|req| {
                    precheck(cfg, req).unwrap_or_else(|| {
                        ConversionResult::new(
                            req,
                            ConversionStatus::EngineNotFound,
                            format!("{}: LibreOffice not found", display_name(&req.source)),
                        )
                    })
                })
                .collect()
        }
    }
}
