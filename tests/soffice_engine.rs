#![cfg(unix)]

use office_pdf::{
    config::Config,
    engine::{soffice::SofficeEngine, Engine, EngineError},
    pipeline::{ConversionStatus, Pipeline},
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const FAKE_SOFFICE: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "LibreOffice 7.6.4.1 fake"
  exit 0
fi
echo "$@" > "$(dirname "$0")/args.txt"
outdir=""
src=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --outdir) outdir="$2"; shift 2 ;;
    *) src="$1"; shift ;;
  esac
done
name=$(basename "$src")
printf '%%PDF-1.4 fake\n' > "$outdir/${name%.*}.pdf"
echo "convert $src -> $outdir/${name%.*}.pdf using filter : writer_pdf_Export"
"#;

const FAILING_SOFFICE: &str = "#!/bin/sh\necho \"Error: source file could not be loaded\" >&2\nexit 3\n";

const HANGING_SOFFICE: &str = "#!/bin/sh\nexec sleep 5\n";

// The launcher hangs and leaves a helper holding stdout and stderr.
const FORKING_SOFFICE: &str = "#!/bin/sh\nsleep 6 &\nexec sleep 6\n";

// 1500 two-byte characters, then a marker, all on stderr.
const NOISY_SOFFICE: &str = r#"#!/bin/sh
i=0
while [ $i -lt 1500 ]; do
  printf '\303\251' >&2
  i=$((i+1))
done
printf 'END' >&2
exit 4
"#;

fn install(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    fs::set_permissions(&p, fs::Permissions::from_mode(0o755)).unwrap();
    p
}

// One test on purpose: scripts are written and executed from a single thread.
#[test]
fn drives_a_soffice_compatible_binary() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let src = work.path().join("report.docx");
    fs::write(&src, b"docx bytes").unwrap();
    let cfg = Config::default();

    // version probe
    let fake = install(tools.path(), "soffice", FAKE_SOFFICE);
    let diag = SofficeEngine::new(&fake, &cfg).doctor().unwrap();
    assert!(diag.ok, "{:?}", diag.error);
    assert_eq!(diag.version.as_deref(), Some("LibreOffice 7.6.4.1 fake"));

    // argument contract plus rename onto the requested name
    let out = work.path().join("out");
    let dest = out.join("report_final.pdf");
    let pipeline = Pipeline::new(&cfg, SofficeEngine::new(&fake, &cfg));
    let r = pipeline.convert(&src, &dest);
    assert_eq!(r.status, ConversionStatus::Success, "{}", r.message);
    assert!(dest.is_file());
    assert!(!out.join("report.pdf").exists());
    let args = fs::read_to_string(tools.path().join("args.txt")).unwrap();
    assert_eq!(
        args.trim(),
        format!(
            "--headless --convert-to pdf --outdir {} {}",
            out.display(),
            src.display()
        )
    );

    // same again with streams discarded
    let mut quiet = cfg.clone();
    quiet.engine.capture_stderr = false;
    let pipeline = Pipeline::new(&quiet, SofficeEngine::new(&fake, &quiet));
    assert!(pipeline.convert(&src, &dest).is_success());

    // non-zero exit
    let failing = install(tools.path(), "soffice-fail", FAILING_SOFFICE);
    let err = SofficeEngine::new(&failing, &cfg)
        .convert_to_pdf(&src, &out)
        .unwrap_err();
    match &err {
        EngineError::Exited { code, stderr } => {
            assert_eq!(*code, Some(3));
            assert!(stderr.contains("could not be loaded"), "{stderr}");
        }
        other => panic!("unexpected error: {other}"),
    }
    let r = Pipeline::new(&cfg, SofficeEngine::new(&failing, &cfg))
        .convert(&src, &out.join("other.pdf"));
    assert_eq!(r.status, ConversionStatus::EngineFailure);

    // timeout kills the engine
    let hanging = install(tools.path(), "soffice-hang", HANGING_SOFFICE);
    let mut impatient = cfg.clone();
    impatient.engine.timeout_seconds = 1;
    let err = SofficeEngine::new(&hanging, &impatient)
        .convert_to_pdf(&src, &out)
        .unwrap_err();
    assert!(matches!(err, EngineError::TimedOut { seconds: 1 }), "{err}");

    // timeout still returns promptly when a helper keeps the pipes open
    let forking = install(tools.path(), "soffice-fork", FORKING_SOFFICE);
    let started = Instant::now();
    let r = Pipeline::new(&impatient, SofficeEngine::new(&forking, &impatient))
        .convert(&src, &out.join("forked.pdf"));
    assert_eq!(r.status, ConversionStatus::EngineFailure, "{}", r.message);
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "took {:?}",
        started.elapsed()
    );

    // long stderr is cut to its tail on a character boundary
    let noisy = install(tools.path(), "soffice-noisy", NOISY_SOFFICE);
    match SofficeEngine::new(&noisy, &cfg).convert_to_pdf(&src, &out) {
        Err(EngineError::Exited { code, stderr }) => {
            assert_eq!(code, Some(4));
            assert!(stderr.len() <= 2000, "{}", stderr.len());
            assert!(stderr.ends_with("END"));
            assert!(stderr.starts_with('\u{e9}'));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    // binary that cannot be started
    let r = Pipeline::new(&cfg, SofficeEngine::new(tools.path().join("absent"), &cfg))
        .convert(&src, &dest);
    assert_eq!(r.status, ConversionStatus::OtherError);
    assert!(r.message.contains("failed to start engine"), "{}", r.message);
}
