use crate::{
    config::Config,
    engine::{soffice::SofficeEngine, Engine},
    formats,
    locate::Locator,
    pipeline::{self, ConversionRequest},
    report::{BatchReport, BatchSummary},
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

#[derive(Parser, Debug)]
#[command(name = "office-pdf")]
#[command(about = "Convert office documents to PDF with LibreOffice (headless)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./office-pdf.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Locate the engine and report what was searched.
    Doctor {},
    /// Show how each input would be handled without converting.
    Plan {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    Convert {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Write PDFs here instead of next to each source.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Exact destination file; only valid with a single input.
        #[arg(long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Plan { inputs, out_dir } => plan(&cfg, inputs, out_dir.as_deref()),
        Command::Convert {
            inputs,
            out_dir,
            output,
        } => convert(&cfg, inputs, out_dir.as_deref(), output.as_deref()),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("office-pdf.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the JSON report; logs go to stderr.
    let stderr_layer = log_layer(std::io::stderr, cfg.logging.json, true);

    let mut guard = None;
    let file_layer = match file_path {
        Some(path) => {
            ensure_dir(&formats::output_dir_of(path))?;
            let file = std::fs::File::create(path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (writer, g) = tracing_appender::non_blocking(file);
            guard = Some(g);
            Some(log_layer(writer, cfg.logging.json, false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn log_layer<S, W>(writer: W, json: bool, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("office-pdf.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let locator = Locator::from_config(cfg);
    let found = locator.locate();
    let diag = match &found {
        Some(path) => Some(SofficeEngine::new(path, cfg).doctor()?),
        None => None,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "platform": locator.platform(),
            "roots": locator.search_roots(),
            "engine": found,
            "diagnosis": diag,
        }))?
    );
    if found.is_none() {
        bail!("LibreOffice (soffice) not found; bundle it under tools/ or install it on PATH");
    }
    Ok(())
}

fn plan(cfg: &Config, inputs: &[PathBuf], out_dir: Option<&Path>) -> Result<()> {
    let out_dir = out_dir.map(Path::to_path_buf).or_else(|| cfg.out_dir());
    let rows: Vec<serde_json::Value> = inputs
        .iter()
        .map(|input| {
            let req = ConversionRequest::for_source(input, out_dir.as_deref());
            serde_json::json!({
                "source": req.source,
                "exists": req.source.exists(),
                "kind": req.kind,
                "supported": formats::is_supported(&req.source),
                "destination": req.destination,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn convert(
    cfg: &Config,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    if output.is_some() && inputs.len() != 1 {
        bail!("--output takes exactly one input, got {}", inputs.len());
    }

    let engine_path = Locator::from_config(cfg).locate();
    let engine = engine_path.as_ref().map(|p| SofficeEngine::new(p, cfg));

    let requests: Vec<ConversionRequest> = match output {
        Some(dest) => vec![ConversionRequest::new(&inputs[0], dest)],
        None => {
            let out_dir = out_dir.map(Path::to_path_buf).or_else(|| cfg.out_dir());
            inputs
                .iter()
                .map(|input| ConversionRequest::for_source(input, out_dir.as_deref()))
                .collect()
        }
    };

    let started = now_rfc3339();
    let results = pipeline::convert_requests(cfg, engine, &requests);

    let report = BatchReport {
        engine: engine_path,
        started,
        finished: now_rfc3339(),
        summary: BatchSummary::from_results(&results),
        results,
    };

    if cfg.global.print_summary {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !report.all_converted() {
        bail!(
            "{} of {} conversions failed",
            report.summary.failed(),
            report.summary.total
        );
    }
    Ok(())
}
