//! Run a bootstrap script (or, with `--source`, a raw figure script) with
//! chart interception installed.
//!
//! Program output and artifact lines go to stdout, tracebacks and logs to
//! stderr. The exit status is the script's.

use std::io::Read;

use chartlens::{Harness, RenderOptions, prepare_bootstrap};
use miette::{IntoDiagnostic, WrapErr};

fn usage() -> ! {
    eprintln!("Usage: chartlens-run [--source] [FILE]");
    eprintln!();
    eprintln!("Reads a bootstrap script from FILE, or stdin when FILE is omitted.");
    eprintln!("  --source    the input is a figure script; encode it into the bootstrap first");
    std::process::exit(2);
}

fn read_input(path: Option<&str>) -> miette::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {path}")),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .into_diagnostic()
                .wrap_err("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> miette::Result<()> {
    // stdout carries the artifact channel, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut source_mode = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--source" => source_mode = true,
            "-h" | "--help" => usage(),
            flag if flag.starts_with('-') => usage(),
            _ if path.is_none() => path = Some(arg),
            _ => usage(),
        }
    }

    let input = read_input(path.as_deref())?;
    let bootstrap = if source_mode { prepare_bootstrap(&input) } else { input };

    let mut harness = Harness::new(std::io::stdout(), std::io::stderr(), RenderOptions::default());
    let status = harness.run(&bootstrap);
    tracing::debug!(status, "script finished");
    std::process::exit(status);
}
