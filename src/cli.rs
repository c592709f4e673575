use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::search::{SearchMode, SearchParams};

pub const DEFAULT_CORPUS_FILE: &str = "knowledge.txt";

#[derive(Debug, Parser)]
#[command(
    name = "linesift",
    version,
    about = "Keyword and embedding similarity search over the lines of a text file"
)]
pub struct Cli {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print shell completions and exit
    #[arg(long, hide = true, value_name = "SHELL", value_enum)]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Generate shell completions and print to stdout.
    pub fn print_completions(shell: Shell) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            shell,
            &mut cmd,
            "linesift",
            &mut std::io::stdout(),
        );
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct SearchArgs {
    /// The search query
    #[arg(required_unless_present = "completions")]
    pub query: Option<String>,

    /// Which search to run
    #[arg(
        short,
        long,
        visible_alias = "type",
        value_enum,
        default_value_t = SearchMode::Both
    )]
    pub mode: SearchMode,

    /// Number of results to return per search
    #[arg(short = 'n', long, default_value = "3")]
    pub top: usize,

    /// Corpus file, one entry per line
    #[arg(short, long, default_value = DEFAULT_CORPUS_FILE)]
    pub file: PathBuf,

    /// Embedding model ID (defaults to $LINESIFT_MODEL or text-embedding-3-small)
    #[arg(long)]
    pub model: Option<String>,

    /// Discard the embedding cache before running similarity search
    #[arg(long)]
    pub rebuild: bool,

    /// Directory for embedding caches (defaults to $LINESIFT_CACHE_DIR or the XDG cache dir)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// Search parameters, or `None` when no query was given.
    pub fn params(&self) -> Option<SearchParams> {
        Some(SearchParams {
            query: self.query.clone()?,
            mode: self.mode,
            top: self.top,
            file: self.file.clone(),
            model: self.model.clone(),
            rebuild: self.rebuild,
            cache_dir: self.cache_dir.clone(),
        })
    }
}
