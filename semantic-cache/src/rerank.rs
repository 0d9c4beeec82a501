use std::collections::HashSet;

/// Weights for the score fusion formula decided for this cache: a
/// semantic-retriever score and a token-overlap rerank are combined as
/// `semantic * SEMANTIC_WEIGHT + overlap * TOKEN_OVERLAP_WEIGHT`.
pub const SEMANTIC_WEIGHT: f32 = 0.7;
pub const TOKEN_OVERLAP_WEIGHT: f32 = 0.3;

fn tokenize(s: &str) -> HashSet<String> {
    s.to_lowercase().split_whitespace().map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string()).filter(|t| !t.is_empty()).collect()
}

/// Jaccard overlap of the two queries' token sets, in `[0, 1]`.
pub fn token_overlap_score(a: &str, b: &str) -> f32 {
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f32 / union as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_queries_score_one() {
        assert_eq!(token_overlap_score("what is the refund policy", "what is the refund policy"), 1.0);
    }

    #[test]
    fn disjoint_queries_score_zero() {
        assert_eq!(token_overlap_score("refund policy", "shipping time"), 0.0);
    }

    #[test]
    fn partial_overlap_is_between_bounds() {
        let score = token_overlap_score("what is the refund policy", "what is the shipping policy");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn punctuation_does_not_affect_tokens() {
        assert_eq!(token_overlap_score("refund policy?", "refund policy"), 1.0);
    }
}
