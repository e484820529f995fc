//! Engine discovery.
//!
//! Bundled layouts under a set of base directories win over a system install:
//! every template is tried under the first root before moving to the next one,
//! then `PATH`, then the platform's conventional install location.

use crate::config::Config;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory a self-extracting bundle unpacked its resources into.
pub const BUNDLE_DIR_ENV: &str = "OFFICE_PDF_BUNDLE_DIR";
pub const SOFFICE_PATH_ENV: &str = "SOFFICE_PATH";

const PATH_NAMES: &[&str] = &["soffice", "libreoffice"];

type Template = &'static [&'static str];

static WINDOWS_CANDIDATES: &[Template] = &[
    &["tools", "LibreOfficePortable", "App", "libreoffice", "program", "soffice.exe"],
    &["tools", "libreoffice", "App", "libreoffice", "program", "soffice.exe"],
    &["tools", "libreoffice", "program", "soffice.exe"],
    &["tools", "LibreOffice", "program", "soffice.exe"],
];

static MACOS_CANDIDATES: &[Template] = &[
    &["tools", "LibreOffice.app", "Contents", "MacOS", "soffice"],
    &["tools", "LibreOfficePortable", "App", "libreoffice", "program", "soffice"],
    &["tools", "libreoffice", "App", "libreoffice", "program", "soffice"],
    &["tools", "libreoffice", "program", "soffice"],
    &["tools", "LibreOffice", "program", "soffice"],
];

static UNIX_CANDIDATES: &[Template] = &[
    &["tools", "LibreOfficePortable", "App", "libreoffice", "program", "soffice"],
    &["tools", "libreoffice", "App", "libreoffice", "program", "soffice"],
    &["tools", "libreoffice", "program", "soffice"],
    &["tools", "LibreOffice", "program", "soffice"],
];

static MACOS_FIXED: &[&str] = &["/Applications/LibreOffice.app/Contents/MacOS/soffice"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    Windows,
    MacOs,
    OtherUnix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::OtherUnix
        }
    }
}

/// Relative paths tried under each root, in order.
pub fn candidate_table(platform: Platform) -> &'static [Template] {
    match platform {
        Platform::Windows => WINDOWS_CANDIDATES,
        Platform::MacOs => MACOS_CANDIDATES,
        Platform::OtherUnix => UNIX_CANDIDATES,
    }
}

/// Absolute locations checked after `PATH`.
pub fn fixed_fallbacks(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::MacOs => MACOS_FIXED,
        Platform::Windows | Platform::OtherUnix => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RootSource {
    ExecutableDir,
    BundleDir,
    SourceDir,
    Configured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRoot {
    pub path: PathBuf,
    pub source: RootSource,
}

impl CandidateRoot {
    pub fn new(path: impl Into<PathBuf>, source: RootSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Roots derived from the running process: binary dir, bundle dir, source tree.
pub fn default_roots() -> Vec<CandidateRoot> {
    let mut roots = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        roots.push(CandidateRoot::new(dir, RootSource::ExecutableDir));
    }
    if let Some(dir) = std::env::var_os(BUNDLE_DIR_ENV).filter(|v| !v.is_empty()) {
        roots.push(CandidateRoot::new(dir, RootSource::BundleDir));
    }
    let source_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    if source_dir.is_dir() {
        roots.push(CandidateRoot::new(source_dir, RootSource::SourceDir));
    }
    roots
}

/// Drops roots that resolve to an already-seen directory, keeping the first.
pub fn dedup_roots(roots: Vec<CandidateRoot>) -> Vec<CandidateRoot> {
    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter(|r| {
            let key = std::fs::canonicalize(&r.path).unwrap_or_else(|_| r.path.clone());
            seen.insert(key)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Locator {
    roots: Vec<CandidateRoot>,
    platform: Platform,
    path_var: Option<OsString>,
    explicit: Option<PathBuf>,
}

impl Locator {
    /// A locator over `roots` only; no `PATH`, no explicit override.
    pub fn new(roots: Vec<CandidateRoot>, platform: Platform) -> Self {
        Self {
            roots: dedup_roots(roots),
            platform,
            path_var: None,
            explicit: None,
        }
    }

    pub fn with_path_var(mut self, path_var: Option<OsString>) -> Self {
        self.path_var = path_var;
        self
    }

    pub fn with_explicit(mut self, explicit: Option<PathBuf>) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn from_env() -> Self {
        Self::new(default_roots(), Platform::current())
            .with_path_var(std::env::var_os("PATH"))
            .with_explicit(explicit_from_env())
    }

    pub fn from_config(cfg: &Config) -> Self {
        let mut roots = default_roots();
        roots.extend(
            cfg.engine
                .search_roots
                .iter()
                .map(|r| CandidateRoot::new(r, RootSource::Configured)),
        );

        let raw = cfg.engine.soffice_path.trim();
        let explicit = if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
            explicit_from_env()
        } else {
            Some(PathBuf::from(raw))
        };

        Self::new(roots, Platform::current())
            .with_path_var(std::env::var_os("PATH"))
            .with_explicit(explicit)
    }

    pub fn search_roots(&self) -> &[CandidateRoot] {
        &self.roots
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.explicit {
            if explicit.exists() {
                info!("using configured engine {}", explicit.display());
                return Some(explicit.clone());
            }
            warn!(
                "configured engine does not exist, falling back to discovery: {}",
                explicit.display()
            );
        }

        let found = self
            .locate_bundled()
            .or_else(|| self.locate_on_path())
            .or_else(|| self.locate_fixed());
        match &found {
            Some(p) => info!("engine found: {}", p.display()),
            None => warn!("no engine found in {} roots or PATH", self.roots.len()),
        }
        found
    }

    fn locate_bundled(&self) -> Option<PathBuf> {
        let templates = candidate_table(self.platform);
        for root in &self.roots {
            for parts in templates {
                let p = parts.iter().fold(root.path.clone(), |acc, part| acc.join(part));
                if p.exists() {
                    debug!("bundled engine hit under {:?} root: {}", root.source, p.display());
                    return Some(p);
                }
            }
        }
        None
    }

    fn locate_on_path(&self) -> Option<PathBuf> {
        let path_var = self.path_var.as_ref()?;
        let dirs: Vec<PathBuf> = std::env::split_paths(path_var).collect();
        for name in PATH_NAMES {
            let mut file_names = vec![name.to_string()];
            if self.platform == Platform::Windows {
                file_names.push(format!("{name}.exe"));
            }
            for dir in &dirs {
                for file_name in &file_names {
                    let p = dir.join(file_name);
                    if is_executable_file(&p) {
                        debug!("engine on PATH: {}", p.display());
                        return Some(p);
                    }
                }
            }
        }
        None
    }

    fn locate_fixed(&self) -> Option<PathBuf> {
        fixed_fallbacks(self.platform)
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}

fn explicit_from_env() -> Option<PathBuf> {
    std::env::var_os(SOFFICE_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Runs discovery against the current process environment.
pub fn locate() -> Option<PathBuf> {
    Locator::from_env().locate()
}

#[cfg(unix)]
fn is_executable_file(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(p)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(p: &Path) -> bool {
    p.is_file()
}
