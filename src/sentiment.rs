//! Deterministic keyword sentiment scoring.
//!
//! This module provides a phrase-weighted heuristic over curated
//! financial-domain phrase lists. It is a secondary signal only; the
//! LLM-produced sentiment is primary.

/// A sentiment-bearing phrase and its weight.
struct WeightedPhrase {
    phrase: &'static str,
    weight: f64,
}

/// Positive financial-domain phrases. Multi-word phrases carry more weight
/// than single keywords.
const POSITIVE_PHRASES: &[WeightedPhrase] = &[
    WeightedPhrase { phrase: "record revenue", weight: 2.0 },
    WeightedPhrase { phrase: "exceeded expectations", weight: 2.0 },
    WeightedPhrase { phrase: "strong demand", weight: 1.5 },
    WeightedPhrase { phrase: "margin expansion", weight: 1.5 },
    WeightedPhrase { phrase: "improved margins", weight: 1.5 },
    WeightedPhrase { phrase: "market share gains", weight: 1.5 },
    WeightedPhrase { phrase: "strong balance sheet", weight: 1.5 },
    WeightedPhrase { phrase: "growth", weight: 1.0 },
    WeightedPhrase { phrase: "profitable", weight: 1.0 },
    WeightedPhrase { phrase: "profitability", weight: 1.0 },
    WeightedPhrase { phrase: "expansion", weight: 1.0 },
    WeightedPhrase { phrase: "innovation", weight: 1.0 },
    WeightedPhrase { phrase: "favorable", weight: 1.0 },
    WeightedPhrase { phrase: "outperform", weight: 1.0 },
    WeightedPhrase { phrase: "resilient", weight: 1.0 },
    WeightedPhrase { phrase: "momentum", weight: 1.0 },
];

/// Negative financial-domain phrases.
const NEGATIVE_PHRASES: &[WeightedPhrase] = &[
    WeightedPhrase { phrase: "going concern", weight: 3.0 },
    WeightedPhrase { phrase: "material weakness", weight: 3.0 },
    WeightedPhrase { phrase: "impairment", weight: 2.0 },
    WeightedPhrase { phrase: "write-down", weight: 2.0 },
    WeightedPhrase { phrase: "covenant violation", weight: 2.0 },
    WeightedPhrase { phrase: "litigation", weight: 1.5 },
    WeightedPhrase { phrase: "restructuring", weight: 1.5 },
    WeightedPhrase { phrase: "headwinds", weight: 1.5 },
    WeightedPhrase { phrase: "decline", weight: 1.0 },
    WeightedPhrase { phrase: "deteriorat", weight: 1.0 },
    WeightedPhrase { phrase: "adverse", weight: 1.0 },
    WeightedPhrase { phrase: "uncertainty", weight: 1.0 },
    WeightedPhrase { phrase: "loss", weight: 1.0 },
    WeightedPhrase { phrase: "weakness", weight: 1.0 },
    WeightedPhrase { phrase: "default", weight: 1.0 },
    WeightedPhrase { phrase: "volatility", weight: 1.0 },
];

/// Texts shorter than this are treated as low-evidence and dampened.
const SHORT_TEXT_CHARS: usize = 100;

/// Dampening factor applied to short texts.
const SHORT_TEXT_DAMPENING: f64 = 0.5;

/// Scores text sentiment in [-1.0, 1.0] from weighted phrase matches.
///
/// Returns 0.0 when no phrases match. Scores for texts under 100 characters
/// are dampened by half.
pub fn score_sentiment(text: &str) -> f64 {
    let lowered = text.to_lowercase();

    let positive: f64 = weighted_matches(&lowered, POSITIVE_PHRASES);
    let negative: f64 = weighted_matches(&lowered, NEGATIVE_PHRASES);

    let total = positive + negative;
    if total == 0.0 {
        return 0.0;
    }

    let mut score = (positive - negative) / total;

    if text.chars().count() < SHORT_TEXT_CHARS {
        score *= SHORT_TEXT_DAMPENING;
    }

    score.clamp(-1.0, 1.0)
}

/// Sums phrase weights over all non-overlapping occurrences in the text.
fn weighted_matches(lowered_text: &str, phrases: &[WeightedPhrase]) -> f64 {
    phrases
        .iter()
        .map(|wp| lowered_text.matches(wp.phrase).count() as f64 * wp.weight)
        .sum()
}

/// Classifies a score into a coarse label for report text.
pub fn sentiment_label(score: f64) -> &'static str {
    if score > 0.25 {
        "positive"
    } else if score < -0.25 {
        "negative"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(score_sentiment(""), 0.0);
    }

    #[test]
    fn test_no_keywords_scores_zero() {
        assert_eq!(score_sentiment("The company is headquartered in Delaware."), 0.0);
    }

    #[test]
    fn test_positive_text_scores_positive() {
        let text = "Record revenue and strong demand drove growth across all segments, \
                    with margin expansion in the services business.";
        assert!(score_sentiment(text) > 0.0);
    }

    #[test]
    fn test_negative_text_scores_negative() {
        let text = "The impairment charge, ongoing litigation, and a material weakness \
                    in internal controls contributed to the decline in operating results.";
        assert!(score_sentiment(text) < 0.0);
    }

    #[test]
    fn test_short_text_dampening() {
        let phrase = "strong demand drove growth";
        assert!(phrase.len() < SHORT_TEXT_CHARS);

        // Same signal repeated past 100 chars loses the dampening.
        let long = phrase.repeat(5);
        assert!(long.len() >= SHORT_TEXT_CHARS);

        let short_score = score_sentiment(phrase);
        let long_score = score_sentiment(&long);

        assert!(short_score > 0.0);
        assert!(short_score.abs() < long_score.abs());
    }

    #[test]
    fn test_score_bounded() {
        let very_negative = "going concern material weakness impairment ".repeat(20);
        let score = score_sentiment(&very_negative);
        assert!((-1.0..=1.0).contains(&score));
        assert_eq!(score, -1.0);
    }

    #[test]
    fn test_mixed_text_between_extremes() {
        let text = "Revenue growth was offset by an impairment charge and litigation \
                    expense, though demand remained resilient through the year end.";
        let score = score_sentiment(text);
        assert!(score > -1.0 && score < 1.0);
    }

    #[test]
    fn test_fixture_sections_score_as_expected() {
        let risk = include_str!("../fixtures/sections/risk_factors.txt");
        let mdna = include_str!("../fixtures/sections/mdna.txt");

        assert!(score_sentiment(risk) < 0.0);
        assert!(score_sentiment(mdna) > 0.0);
    }

    #[test]
    fn test_sentiment_label() {
        assert_eq!(sentiment_label(0.8), "positive");
        assert_eq!(sentiment_label(-0.8), "negative");
        assert_eq!(sentiment_label(0.0), "neutral");
    }
}
