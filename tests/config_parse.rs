use office_pdf::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../office-pdf.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.engine.soffice_path, "auto");
    assert!(cfg.engine.timeout_seconds > 0);
    assert!(cfg.output.overwrite);
    assert!(cfg.out_dir().is_none());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[output]\nout_dir = \"pdf\"\noverwrite = false\nstage_in_temp_dir = true\n")
        .expect("parse TOML");
    assert_eq!(cfg.out_dir().as_deref(), Some(std::path::Path::new("pdf")));
    assert!(!cfg.output.overwrite);
    assert!(cfg.engine.capture_stderr);
    assert_eq!(cfg.logging.level, "info");
}
