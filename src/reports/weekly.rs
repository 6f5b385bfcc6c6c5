use crate::domain::{Feedback, Rating};
use chrono::{DateTime, Duration, Utc};

pub const NEGATIVE_SAMPLE_SIZE: usize = 5;
pub const POSITIVE_SAMPLE_SIZE: usize = 3;

/// The two seven-day windows a report compares, both half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindows {
    pub current_start: DateTime<Utc>,
    pub previous_start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindows {
    pub fn ending_at(end: DateTime<Utc>) -> Self {
        let current_start = end - Duration::days(7);
        Self {
            current_start,
            previous_start: current_start - Duration::days(7),
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RatingCounts {
    pub bad: usize,
    pub okay: usize,
    pub great: usize,
}

impl RatingCounts {
    pub fn tally(feedbacks: &[Feedback]) -> Self {
        feedbacks
            .iter()
            .fold(Self::default(), |mut counts, feedback| {
                match feedback.rating {
                    Rating::Bad => counts.bad += 1,
                    Rating::Okay => counts.okay += 1,
                    Rating::Great => counts.great += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.bad + self.okay + self.great
    }

    /// Share of `great` ratings, 0 for an empty window.
    pub fn happiness(&self) -> u32 {
        percentage(self.great, self.total())
    }

    pub fn shares(&self) -> RatingShares {
        let total = self.total();
        RatingShares {
            bad: percentage(self.bad, total),
            okay: percentage(self.okay, total),
            great: percentage(self.great, total),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RatingShares {
    pub bad: u32,
    pub okay: u32,
    pub great: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increase,
    Decrease,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute difference in feedback volume.
    pub difference: usize,
    /// Signed change relative to the previous window; absent when it was empty.
    pub percent_change: Option<i64>,
}

impl Trend {
    pub fn between(current_total: usize, previous_total: usize) -> Self {
        let diff = current_total as i64 - previous_total as i64;
        let direction = match diff {
            d if d > 0 => TrendDirection::Increase,
            d if d < 0 => TrendDirection::Decrease,
            _ => TrendDirection::Flat,
        };
        let percent_change = (previous_total > 0)
            .then(|| round_half_up(diff as f64 / previous_total as f64 * 100.0) as i64);
        Self {
            direction,
            difference: diff.unsigned_abs() as usize,
            percent_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSample {
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub counts: RatingCounts,
    pub shares: RatingShares,
    pub total: usize,
    pub happiness: u32,
    pub previous_total: usize,
    pub previous_happiness: u32,
    pub trend: Trend,
    pub negative_comments: Vec<CommentSample>,
    pub positive_comments: Vec<CommentSample>,
}

impl WeeklyReport {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Summarises one establishment's week against the week before.
///
/// Both slices are expected newest first; comment samples keep that order.
pub fn aggregate(current: &[Feedback], previous: &[Feedback]) -> WeeklyReport {
    let counts = RatingCounts::tally(current);
    let previous_counts = RatingCounts::tally(previous);
    WeeklyReport {
        counts,
        shares: counts.shares(),
        total: counts.total(),
        happiness: counts.happiness(),
        previous_total: previous_counts.total(),
        previous_happiness: previous_counts.happiness(),
        trend: Trend::between(counts.total(), previous_counts.total()),
        negative_comments: sample_comments(current, Rating::Bad, NEGATIVE_SAMPLE_SIZE),
        positive_comments: sample_comments(current, Rating::Great, POSITIVE_SAMPLE_SIZE),
    }
}

fn sample_comments(feedbacks: &[Feedback], rating: Rating, limit: usize) -> Vec<CommentSample> {
    feedbacks
        .iter()
        .filter(|f| f.rating == rating)
        .filter_map(|f| {
            f.comment_text().map(|comment| CommentSample {
                comment: comment.to_string(),
                created_at: f.created_at,
            })
        })
        .take(limit)
        .collect()
}

/// `round(part / total * 100)`, rounding halves up. 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    round_half_up(part as f64 / total as f64 * 100.0) as u32
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
