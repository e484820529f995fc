use super::{types::*, Engine};
use crate::config::Config;
use anyhow::Result;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const STDERR_TAIL_BYTES: usize = 2000;

/// LibreOffice driven through its headless command line.
pub struct SofficeEngine {
    soffice: PathBuf,
    timeout: Option<Duration>,
    capture_stderr: bool,
}

impl SofficeEngine {
    pub fn new(soffice: impl Into<PathBuf>, cfg: &Config) -> Self {
        let timeout = if cfg.engine.timeout_seconds > 0 {
            Some(Duration::from_secs(cfg.engine.timeout_seconds))
        } else {
            None
        };
        Self {
            soffice: soffice.into(),
            timeout,
            capture_stderr: cfg.engine.capture_stderr,
        }
    }

    fn run<S: AsRef<OsStr>>(&self, args: &[S], capture: bool) -> Result<Output, EngineError> {
        debug!(
            "soffice run {} args={:?} timeout={:?}",
            self.soffice.display(),
            args.iter().map(|a| a.as_ref()).collect::<Vec<&OsStr>>(),
            self.timeout
        );
        let mut cmd = Command::new(&self.soffice);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        if capture {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());
        }

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            path: self.soffice.clone(),
            source,
        })?;

        match self.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout),
            None => Ok(child.wait_with_output()?),
        }
    }
}

impl Engine for SofficeEngine {
    fn doctor(&self) -> Result<EngineDiag> {
        let engine_path = self.soffice.display().to_string();
        let diag = match self.run(&["--version"], true) {
            Ok(out) if out.status.success() => EngineDiag {
                engine_path,
                version: Some(String::from_utf8_lossy(&out.stdout).trim().to_string()),
                ok: true,
                error: None,
            },
            Ok(out) => EngineDiag {
                engine_path,
                version: None,
                ok: false,
                error: Some(exited(out.status, &out.stderr).to_string()),
            },
            Err(err) => EngineDiag {
                engine_path,
                version: None,
                ok: false,
                error: Some(err.to_string()),
            },
        };
        Ok(diag)
    }

    fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<(), EngineError> {
        let args: [&OsStr; 6] = [
            OsStr::new("--headless"),
            OsStr::new("--convert-to"),
            OsStr::new("pdf"),
            OsStr::new("--outdir"),
            out_dir.as_os_str(),
            source.as_os_str(),
        ];
        let output = self.run(&args, self.capture_stderr)?;

        if !output.status.success() {
            return Err(exited(output.status, &output.stderr));
        }

        if !output.stdout.is_empty() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            debug!("soffice stdout {}: {}", source.display(), stdout.trim());
        }
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("soffice stderr {}: {}", source.display(), stderr.trim());
        }
        Ok(())
    }
}

fn exited(status: ExitStatus, stderr: &[u8]) -> EngineError {
    let stderr = String::from_utf8_lossy(stderr);
    EngineError::Exited {
        code: status.code(),
        stderr: tail(stderr.trim(), STDERR_TAIL_BYTES).to_string(),
    }
}

fn tail(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut start = s.len() - max_bytes;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output, EngineError> {
    // Drain pipes while waiting so a chatty engine can't block on a full buffer.
    let stdout_thread = spawn_reader(child.stdout.take());
    let stderr_thread = spawn_reader(child.stderr.take());

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Output {
                status,
                stdout: join_reader(stdout_thread)?,
                stderr: join_reader(stderr_thread)?,
            });
        }

        if start.elapsed() > timeout {
            warn!("soffice timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait()?;
            // A helper process started by the launcher can outlive it and keep
            // the pipes open, so the readers are detached instead of joined.
            drop(stdout_thread);
            drop(stderr_thread);
            return Err(EngineError::TimedOut {
                seconds: timeout.as_secs(),
            });
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_reader(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>, EngineError> {
    let buf = handle
        .join()
        .map_err(|_| std::io::Error::other("pipe reader thread panicked"))??;
    Ok(buf)
}
