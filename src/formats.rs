use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    WordProcessing,
    Spreadsheet,
    Presentation,
}

/// Extensions the engine is driven for, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[(&str, DocumentKind)] = &[
    ("docx", DocumentKind::WordProcessing),
    ("doc", DocumentKind::WordProcessing),
    ("odt", DocumentKind::WordProcessing),
    ("pptx", DocumentKind::Presentation),
    ("ppt", DocumentKind::Presentation),
    ("odp", DocumentKind::Presentation),
    ("xlsx", DocumentKind::Spreadsheet),
    ("xls", DocumentKind::Spreadsheet),
    ("ods", DocumentKind::Spreadsheet),
];

pub fn classify(path: &Path) -> Option<DocumentKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, kind)| *kind)
}

pub fn is_supported(path: &Path) -> bool {
    classify(path).is_some()
}

/// Where a source lands when the caller names no explicit destination:
/// `<out_dir>/<stem>.pdf` with an override, otherwise next to the source.
pub fn default_destination(source: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            dir.join(format!("{stem}.pdf"))
        }
        None => source.with_extension("pdf"),
    }
}

/// The file name the engine gives its output; not configurable on the command line.
pub fn engine_output_name(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_string_lossy();
    Some(format!("{stem}.pdf"))
}

/// Directory the engine is pointed at for a destination. Bare file names map to `.`.
pub fn output_dir_of(destination: &Path) -> PathBuf {
    match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
