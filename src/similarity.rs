use tracing::debug;

use crate::{
    error::{Error, Result},
    provider::EmbeddingProvider,
    ranking::{self, ScoredLine},
};

/// `dot(a, b) / (|a| * |b|)`, or 0.0 if either vector has zero norm.
///
/// A zero vector is treated as unlike everything, itself included.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    let denom = (norm_a * norm_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom) as f32
}

/// Rank every row of `vectors` against an already-embedded query.
///
/// No threshold is applied; the `top_k` best rows are returned whatever
/// their score.
pub fn rank(
    query_vector: &[f32],
    vectors: &[Vec<f32>],
    top_k: usize,
) -> Result<Vec<ScoredLine>> {
    let scored = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if v.len() != query_vector.len() {
                return Err(Error::DimensionMismatch {
                    expected: v.len(),
                    found: query_vector.len(),
                });
            }
            Ok(ScoredLine::new(cosine_similarity(query_vector, v), i))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ranking::top_k(scored, top_k))
}

/// Embed `query` with one provider call and rank `vectors` against it.
///
/// `lines` and `vectors` must be aligned by position. An empty table
/// yields no results without contacting the provider.
pub fn search(
    query: &str,
    lines: &[String],
    vectors: &[Vec<f32>],
    provider: &dyn EmbeddingProvider,
    model_id: &str,
    top_k: usize,
) -> Result<Vec<ScoredLine>> {
    if lines.len() != vectors.len() {
        return Err(Error::Misaligned {
            lines: lines.len(),
            vectors: vectors.len(),
        });
    }
    if vectors.is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = provider
        .embed(&[query.to_string()], model_id)?
        .into_iter()
        .next()
        .ok_or(Error::EmptyEmbedding)?;
    if query_vector.iter().any(|x| !x.is_finite()) {
        return Err(Error::NonFiniteVector { index: 0 });
    }
    debug!(dimension = query_vector.len(), "embedded query");

    rank(&query_vector, vectors, top_k)
}
