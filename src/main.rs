use anyhow::Result;
use clap::Parser;
use office_pdf::cli;
use tracing::error;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args) {
        // Config and logging errors happen before any subscriber exists.
        if tracing::dispatcher::has_been_set() {
            error!("{:#}", err);
        } else {
            eprintln!("office-pdf: {:#}", err);
        }
        std::process::exit(1);
    }
    Ok(())
}
