use std::cmp::Ordering;

/// A corpus line paired with the score it received for some query.
///
/// `index` is the zero-based position of the line in the corpus that
/// produced the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredLine {
    pub score: f32,
    pub index: usize,
}

impl ScoredLine {
    pub fn new(score: f32, index: usize) -> Self {
        Self { score, index }
    }
}

/// Sort by score descending, breaking ties by ascending corpus index, and
/// keep at most `top_k` entries. NaN scores rank after every number.
pub fn top_k(mut scored: Vec<ScoredLine>, top_k: usize) -> Vec<ScoredLine> {
    scored.sort_by(|a, b| {
        a.score
            .is_nan()
            .cmp(&b.score.is_nan())
            .then_with(|| {
                b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.index.cmp(&b.index))
    });
    scored.truncate(top_k);
    scored
}
