use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use linesift::{
    CacheDir,
    CacheOutcome,
    CacheStatus,
    EmbeddingCache,
    EmbeddingProvider,
    Result,
    cache,
    similarity,
};

/// Deterministic provider that hashes characters into a small vector and
/// records every batch it receives.
#[derive(Default)]
struct RecordingProvider {
    batches: RefCell<Vec<(String, usize)>>,
}

impl RecordingProvider {
    fn calls(&self) -> usize {
        self.batches.borrow().len()
    }
}

impl EmbeddingProvider for RecordingProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> Result<Vec<Vec<f32>>> {
        self.batches
            .borrow_mut()
            .push((model_id.to_string(), texts.len()));
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; 8];
                for b in t.bytes() {
                    v[(b % 8) as usize] += 1.0;
                }
                v
            })
            .collect())
    }
}

fn write_corpus(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("knowledge.txt");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn cache_survives_reopen_and_tracks_inputs() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = write_corpus(tmp.path(), "alpha beta\ngamma delta\n");
    let cache_root = tmp.path().join("cache");
    let cache_dir = CacheDir::resolve(Some(cache_root.as_path())).unwrap();
    let provider = RecordingProvider::default();

    let path = cache_dir.record_path(&corpus, "model-a");
    let (first, outcome) = EmbeddingCache::new(&path)
        .load_or_build(&corpus, "model-a", false, &provider)
        .unwrap();
    assert_eq!(
        outcome,
        CacheOutcome::Built {
            cause: CacheStatus::Missing
        }
    );
    assert_eq!(*provider.batches.borrow(), vec![("model-a".to_string(), 2)]);

    // A fresh handle on the same file sees the persisted record.
    let (second, outcome) = EmbeddingCache::new(&path)
        .load_or_build(&corpus, "model-a", false, &provider)
        .unwrap();
    assert_eq!(outcome, CacheOutcome::Reused);
    assert_eq!(second, first);
    assert_eq!(provider.calls(), 1);

    // Another model gets its own file under the cache directory.
    let other = cache_dir.record_path(&corpus, "model-b");
    assert_ne!(other, path);
    let (record_b, _) = EmbeddingCache::new(&other)
        .load_or_build(&corpus, "model-b", false, &provider)
        .unwrap();
    assert_eq!(record_b.model_id, "model-b");
    assert_eq!(provider.calls(), 2);

    // Editing the corpus invalidates by content.
    write_corpus(tmp.path(), "alpha beta\ngamma delta\nepsilon\n");
    let (third, outcome) = EmbeddingCache::new(&path)
        .load_or_build(&corpus, "model-a", false, &provider)
        .unwrap();
    assert!(outcome.rebuilt());
    assert_eq!(third.lines.len(), 3);
    assert_eq!(third.fingerprint, cache::fingerprint(&corpus).unwrap());
    assert_eq!(provider.calls(), 3);
}

#[test]
fn copied_corpus_with_same_bytes_reuses_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = write_corpus(tmp.path(), "one line\nanother line\n");
    let cache_path = tmp.path().join("shared.cache.json");
    let provider = RecordingProvider::default();
    let cache = EmbeddingCache::new(&cache_path);

    cache.load_or_build(&corpus, "m", false, &provider).unwrap();

    let copy_dir = tmp.path().join("copy");
    std::fs::create_dir(&copy_dir).unwrap();
    let copy = copy_dir.join("knowledge.txt");
    std::fs::copy(&corpus, &copy).unwrap();

    let (_, outcome) = cache.load_or_build(&copy, "m", false, &provider).unwrap();
    assert_eq!(outcome, CacheOutcome::Reused);
    assert_eq!(provider.calls(), 1);
}

#[test]
fn cached_vectors_feed_similarity_search() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = write_corpus(tmp.path(), "aaaa\nbbbb\nabab\n");
    let provider = RecordingProvider::default();
    let cache = EmbeddingCache::new(tmp.path().join("c.json"));

    let (record, _) = cache.load_or_build(&corpus, "m", false, &provider).unwrap();
    let hits = similarity::search(
        "aaaa",
        &record.lines,
        &record.vectors,
        &provider,
        "m",
        2,
    )
    .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].index, 0);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
    assert_eq!(hits[1].index, 2);
    // Corpus batch, then a single-text query batch.
    assert_eq!(
        *provider.batches.borrow(),
        vec![("m".to_string(), 3), ("m".to_string(), 1)]
    );
}
