use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::{
    cache::{CacheOutcome, EmbeddingCache},
    cache_dir::CacheDir,
    corpus,
    error::Result,
    keyword::KeywordScorer,
    provider::{self, EmbeddingProvider},
    ranking::ScoredLine,
    similarity,
};

/// Which searches a single invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchMode {
    Keyword,
    Similarity,
    Both,
}

impl SearchMode {
    pub fn runs_keyword(self) -> bool {
        matches!(self, Self::Keyword | Self::Both)
    }

    pub fn runs_similarity(self) -> bool {
        matches!(self, Self::Similarity | Self::Both)
    }
}

/// Inputs for [`execute_search`].
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub mode: SearchMode,
    pub top: usize,
    pub file: PathBuf,
    /// Falls back to `$LINESIFT_MODEL`, then the default model.
    pub model: Option<String>,
    pub rebuild: bool,
    /// Falls back to `$LINESIFT_CACHE_DIR`, then the XDG cache directory.
    pub cache_dir: Option<PathBuf>,
}

/// One ranked line, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// 1-based position in the result list.
    pub rank: usize,
    pub score: f32,
    /// 1-based line number among the corpus's non-empty lines.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub path: PathBuf,
    pub rebuilt: bool,
}

/// Results of every search requested in one invocation.
///
/// The keyword and similarity lists are ranked independently.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<Vec<Hit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<Vec<Hit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheReport>,
}

/// Execute the searches selected by `args.mode`.
///
/// 1. Read the corpus (a missing file aborts before any scoring)
/// 2. Keyword search against the corpus lines
/// 3. Similarity search: build the provider, load or rebuild the
///    embedding cache, then rank the cached vectors
///
/// `make_provider` is only called when similarity search runs, so
/// keyword-only searches need no credentials.
pub fn execute_search<F, P>(
    args: &SearchParams,
    make_provider: F,
) -> Result<SearchReport>
where
    F: FnOnce() -> Result<P>,
    P: EmbeddingProvider,
{
    let lines = corpus::load_lines(&args.file)?;

    let mut report = SearchReport {
        query: args.query.clone(),
        keyword: None,
        similarity: None,
        cache: None,
    };

    if args.mode.runs_keyword() {
        let scored =
            KeywordScorer::default().search(&args.query, &lines, args.top);
        report.keyword = Some(to_hits(&scored, &lines));
    }

    if args.mode.runs_similarity() {
        let model_id = provider::resolve_model_id(args.model.as_deref());
        let provider = make_provider()?;
        let cache_dir = CacheDir::resolve(args.cache_dir.as_deref())?;
        let cache =
            EmbeddingCache::new(cache_dir.record_path(&args.file, &model_id));

        let (record, outcome) = cache.load_or_build(
            &args.file,
            &model_id,
            args.rebuild,
            &provider,
        )?;
        if let CacheOutcome::Built { cause } = &outcome {
            info!(?cause, path = %cache.path().display(), "rebuilt embedding cache");
        }

        let scored = similarity::search(
            &args.query,
            &record.lines,
            &record.vectors,
            &provider,
            &model_id,
            args.top,
        )?;
        report.similarity = Some(to_hits(&scored, &record.lines));
        report.cache = Some(CacheReport {
            path: cache.path().to_path_buf(),
            rebuilt: outcome.rebuilt(),
        });
    }

    Ok(report)
}

fn to_hits(scored: &[ScoredLine], lines: &[String]) -> Vec<Hit> {
    scored
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            lines.get(s.index).map(|text| Hit {
                rank: i + 1,
                score: s.score,
                line: s.index + 1,
                text: text.clone(),
            })
        })
        .collect()
}

/// Format a report for human-readable terminal output.
pub fn render_human(report: &SearchReport) -> String {
    let mut out = format!("\n=== Query ===\n{}\n", report.query);

    if let Some(hits) = &report.keyword {
        out.push_str("\n=== Keyword Search Results ===\n");
        render_hits(&mut out, hits, 3);
    }

    if let Some(hits) = &report.similarity {
        out.push_str("\n=== Similarity Search Results ===\n");
        render_hits(&mut out, hits, 4);
    }

    if let Some(cache) = &report.cache {
        let name = cache
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cache.path.display().to_string());
        let note = if cache.rebuilt { ", rebuilt" } else { "" };
        out.push_str(&format!("\n(Cache: {name}{note})\n"));
    }

    out
}

fn render_hits(out: &mut String, hits: &[Hit], precision: usize) {
    if hits.is_empty() {
        out.push_str("(no matches found)\n");
        return;
    }
    for hit in hits {
        out.push_str(&format!(
            "\n#{}  score={:.*}  line={}\n{}\n",
            hit.rank, precision, hit.score, hit.line, hit.text
        ));
    }
}

/// Format a report as a JSON document.
pub fn render_json(report: &SearchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
