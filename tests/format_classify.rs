use office_pdf::formats::{
    classify, default_destination, engine_output_name, is_supported, output_dir_of, DocumentKind,
};
use std::path::{Path, PathBuf};

#[test]
fn classifies_each_family() {
    assert_eq!(classify(Path::new("a/report.docx")), Some(DocumentKind::WordProcessing));
    assert_eq!(classify(Path::new("notes.odt")), Some(DocumentKind::WordProcessing));
    assert_eq!(classify(Path::new("budget.xls")), Some(DocumentKind::Spreadsheet));
    assert_eq!(classify(Path::new("deck.odp")), Some(DocumentKind::Presentation));
}

#[test]
fn extension_match_ignores_case() {
    assert!(is_supported(Path::new("REPORT.DOCX")));
    assert!(is_supported(Path::new("Deck.PpTx")));
}

#[test]
fn rejects_other_extensions() {
    assert!(!is_supported(Path::new("scan.pdf")));
    assert!(!is_supported(Path::new("README")));
    assert!(!is_supported(Path::new("archive.docx.zip")));
    assert!(!is_supported(Path::new(".docx")));
}

#[test]
fn default_destination_next_to_source_or_in_out_dir() {
    assert_eq!(
        default_destination(Path::new("in/report.docx"), None),
        PathBuf::from("in/report.pdf")
    );
    assert_eq!(
        default_destination(Path::new("in/report.docx"), Some(Path::new("out"))),
        PathBuf::from("out/report.pdf")
    );
}

#[test]
fn engine_names_output_after_source_stem() {
    assert_eq!(engine_output_name(Path::new("x/q3.final.xlsx")).as_deref(), Some("q3.final.pdf"));
}

#[test]
fn bare_destination_uses_current_dir() {
    assert_eq!(output_dir_of(Path::new("report.pdf")), PathBuf::from("."));
    assert_eq!(output_dir_of(Path::new("out/report.pdf")), PathBuf::from("out"));
}
