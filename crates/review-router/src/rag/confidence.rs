//! Answer confidence from the top cross-encoder logit.

/// Confidence reported when results were not reranked.
pub const UNRANKED_CONFIDENCE: f64 = 0.5;

/// Logistic function, saturating to exactly 0 or 1 where `exp` would
/// overflow.
pub fn sigmoid(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    if x > 700.0 {
        return 1.0;
    }
    if x < -700.0 {
        return 0.0;
    }
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `sigmoid(score)`, halved for negative logits; [`UNRANKED_CONFIDENCE`]
/// without a score. Rounded to 4 decimals, always in `[0, 1]`.
pub fn confidence(top_rerank_score: Option<f32>) -> f64 {
    let Some(score) = top_rerank_score else {
        return UNRANKED_CONFIDENCE;
    };
    let score = score as f64;
    let mut value = sigmoid(score);
    if score < 0.0 {
        value *= 0.5;
    }
    round4(value.clamp(0.0, 1.0))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_reference_points() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(2.0) - 0.880_797).abs() < 1e-6);
        assert!((sigmoid(-2.0) - 0.119_203).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_extremes() {
        assert_eq!(sigmoid(1e6), 1.0);
        assert_eq!(sigmoid(-1e6), 0.0);
        assert_eq!(sigmoid(f64::INFINITY), 1.0);
        assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_confidence_values() {
        assert_eq!(confidence(None), 0.5);
        assert_eq!(confidence(Some(0.0)), 0.5);
        assert_eq!(confidence(Some(2.0)), 0.8808);
        // negative logits are halved
        assert_eq!(confidence(Some(-2.0)), 0.0596);
    }

    #[test]
    fn test_confidence_monotonic_and_bounded() {
        let mut previous = -1.0;
        let mut score = -50.0f32;
        while score <= 50.0 {
            let c = confidence(Some(score));
            assert!((0.0..=1.0).contains(&c), "confidence {} out of range", c);
            assert!(c >= previous, "confidence dropped at score {}", score);
            previous = c;
            score += 0.25;
        }
    }
}
