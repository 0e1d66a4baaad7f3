use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything that carries a single ranking score
pub trait Ranked {
    fn score(&self) -> f64;
}

/// Sort highest score first. Ties keep their discovery order.
pub fn rank_descending<T: Ranked>(items: &mut [T]) {
    items.sort_by(|a, b| b.score().total_cmp(&a.score()));
}

/// Parse a provider rating string, dropping "N/A" and anything non-numeric
pub fn parse_rating(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Statistical median; 0 for an empty input
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let middle = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

/// Arithmetic mean; 0 for an empty input
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Whole days between publication and `now`, never negative
pub fn age_in_days(published_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - published_at).num_days().max(0)
}

/// Raw engagement counters for one video
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Engagement {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Weights for the velocity + engagement video score:
/// `views * view_weight / (age_days + age_offset_days) + likes * like_weight + comments * comment_weight`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub view_weight: f64,
    pub age_offset_days: f64,
    pub like_weight: f64,
    pub comment_weight: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            view_weight: 15.0,
            age_offset_days: 30.0,
            like_weight: 0.3,
            comment_weight: 0.1,
        }
    }
}

impl EngagementWeights {
    pub fn score(&self, engagement: Engagement, age_days: i64) -> f64 {
        let velocity =
            (engagement.views as f64 * self.view_weight) / (age_days as f64 + self.age_offset_days);
        let interaction = engagement.likes as f64 * self.like_weight
            + engagement.comments as f64 * self.comment_weight;
        velocity + interaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_median_cases() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[7.0]), 7.0);
        assert_eq!(median(&[6.0, 8.0]), 7.0);
        assert_eq!(median(&[5.0, 6.0, 9.0]), 6.0);
    }

    #[test]
    fn test_median_ignores_input_order() {
        let sorted = [1.5, 3.0, 4.25, 7.0, 8.5, 9.9];
        let shuffled = [8.5, 1.5, 9.9, 4.25, 7.0, 3.0];
        assert_eq!(median(&sorted), median(&shuffled));

        let odd_sorted = [2.0, 3.0, 5.0, 8.0, 13.0];
        let odd_shuffled = [13.0, 5.0, 2.0, 8.0, 3.0];
        assert_eq!(median(&odd_sorted), median(&odd_shuffled));
    }

    #[test]
    fn test_mean_cases() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[10.0, 20.0]), 15.0);
    }

    #[test]
    fn test_parse_rating_skips_unavailable() {
        assert_eq!(parse_rating("8.7"), Some(8.7));
        assert_eq!(parse_rating("N/A"), None);
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("great"), None);
    }

    #[test]
    fn test_engagement_score_is_exact() {
        let weights = EngagementWeights::default();
        let score = weights.score(
            Engagement {
                views: 1000,
                likes: 100,
                comments: 50,
            },
            0,
        );
        assert_eq!(score, 535.0);
    }

    #[test]
    fn test_older_videos_decay() {
        let weights = EngagementWeights::default();
        let engagement = Engagement {
            views: 10_000,
            likes: 0,
            comments: 0,
        };
        assert!(weights.score(engagement, 0) > weights.score(engagement, 365));
    }

    #[test]
    fn test_age_in_days_truncates_and_clamps() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let published = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        assert_eq!(age_in_days(published, now), 8);

        let future = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        assert_eq!(age_in_days(future, now), 0);
    }

    struct Scored(&'static str, f64);

    impl Ranked for Scored {
        fn score(&self) -> f64 {
            self.1
        }
    }

    #[test]
    fn test_rank_descending_is_stable() {
        let mut items = vec![
            Scored("a", 1.0),
            Scored("b", 3.0),
            Scored("c", 1.0),
            Scored("d", 2.0),
        ];
        rank_descending(&mut items);
        let order: Vec<&str> = items.iter().map(|s| s.0).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }
}
