//! Office documents to PDF through a headless LibreOffice.
//!
//! [`locate`] finds an engine binary, [`pipeline`] drives it once per input and
//! reports one [`pipeline::ConversionResult`] per document.

pub mod cli;
pub mod config;
pub mod engine;
pub mod formats;
pub mod locate;
pub mod pipeline;
pub mod report;
pub mod util;
