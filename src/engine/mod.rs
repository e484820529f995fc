pub mod soffice;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::{EngineDiag, EngineError};

pub trait Engine {
    fn doctor(&self) -> Result<EngineDiag>;
    /// Converts `source` to PDF, writing `<source-stem>.pdf` into `out_dir`.
    fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<(), EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn doctor(&self) -> Result<EngineDiag> {
        (**self).doctor()
    }

    fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<(), EngineError> {
        (**self).convert_to_pdf(source, out_dir)
    }
}
