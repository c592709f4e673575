//! linesift - keyword and embedding similarity search over a text file.
//!
//! Every non-empty line of a corpus file is a document. Two independent
//! rankings are offered: lexical term overlap via [`KeywordScorer`], and
//! cosine similarity between embeddings produced by an
//! [`EmbeddingProvider`]. Corpus embeddings are kept in an on-disk
//! [`EmbeddingCache`] keyed by the corpus's SHA-256 and the model ID, so
//! they are only recomputed when either changes.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use linesift::{EmbeddingCache, KeywordScorer, OpenAiProvider, corpus, similarity};
//!
//! let path = Path::new("knowledge.txt");
//! let lines = corpus::load_lines(path).unwrap();
//!
//! for hit in KeywordScorer::default().search("recover from malware", &lines, 3) {
//!     println!("{:.3} {}", hit.score, lines[hit.index]);
//! }
//!
//! let provider = OpenAiProvider::from_env().unwrap();
//! let cache = EmbeddingCache::new("knowledge.cache.json");
//! let (record, _) = cache
//!     .load_or_build(path, "text-embedding-3-small", false, &provider)
//!     .unwrap();
//! let hits = similarity::search(
//!     "recover from malware",
//!     &record.lines,
//!     &record.vectors,
//!     &provider,
//!     "text-embedding-3-small",
//!     3,
//! )
//! .unwrap();
//! for hit in hits {
//!     println!("{:.4} {}", hit.score, record.lines[hit.index]);
//! }
//! ```

pub mod cache;
pub mod cache_dir;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod keyword;
pub mod provider;
pub mod ranking;
pub mod search;
pub mod similarity;

pub use cache::{CacheOutcome, CacheRecord, CacheStatus, EmbeddingCache};
pub use cache_dir::CacheDir;
pub use error::{Error, Result};
pub use keyword::KeywordScorer;
pub use provider::{EmbeddingProvider, OpenAiProvider};
pub use ranking::ScoredLine;
