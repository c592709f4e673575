use std::path::Path;

use clap::Parser;
use linesift::{
    OpenAiProvider,
    cli::Cli,
    error::{Error, Result},
    search,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "LINESIFT_LOG";

/// Log to stderr. `LINESIFT_LOG` takes a full filter directive and
/// overrides both flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .without_time()
        .init();
}

/// Build the embedding provider, first loading a `.env` file that sits
/// next to the corpus. Values from the file take precedence over the
/// process environment.
fn load_provider(corpus_path: &Path) -> Result<OpenAiProvider> {
    let dir = match corpus_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let env_path = dir.join(".env");

    match dotenvy::from_path_override(&env_path) {
        Ok(()) => debug!(path = %env_path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => {
            return Err(Error::Config(format!(
                "cannot load {}: {e}",
                env_path.display()
            )));
        }
    }

    OpenAiProvider::from_env()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Some(shell) = cli.completions {
        Cli::print_completions(shell);
        return Ok(());
    }

    let params = cli
        .search
        .params()
        .ok_or_else(|| Error::Config("a query is required".into()))?;
    let report =
        search::execute_search(&params, || load_provider(&params.file))?;

    if cli.search.json {
        println!("{}", search::render_json(&report)?);
    } else {
        print!("{}", search::render_human(&report));
        println!("\nDone.");
    }

    Ok(())
}
