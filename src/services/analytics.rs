//! Collection statistics.
//!
//! Aggregates are computed in Rust over rows loaded from the repository, so
//! they behave the same on every SQLite build.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::ServiceResult;
use crate::models::StoredText;
use crate::repository::DbContext;

/// Label used for texts stored without a filename.
pub const NO_FILENAME: &str = "(none)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub avg_text_length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCount {
    pub id: i32,
    pub name: String,
    pub count: i64,
}

/// Bucket width for activity series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Hour,
    Day,
    Week,
    Month,
}

impl Interval {
    /// Parse an interval, falling back to day.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("hour") => Self::Hour,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::Day,
        }
    }

    /// Start of the bucket containing `ts`. Weeks start on Monday.
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Self::Hour => date.and_hms_opt(ts.hour(), 0, 0),
            Self::Day => date.and_hms_opt(0, 0, 0),
            Self::Week => {
                let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
                monday.and_hms_opt(0, 0, 0)
            }
            Self::Month => {
                NaiveDate::from_ymd_opt(date.year(), date.month(), 1).and_then(|d| d.and_hms_opt(0, 0, 0))
            }
        };
        start.map(|naive| Utc.from_utc_datetime(&naive)).unwrap_or(ts)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityPoint {
    pub bucket: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub series: Vec<ActivityPoint>,
    pub interval: Interval,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub bucket: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthHistogram {
    pub bins: Vec<HistogramBin>,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilenameCount {
    pub name: String,
    pub count: usize,
}

pub fn stats(texts: &[StoredText]) -> Stats {
    let count = texts.len();
    let avg_text_length = if count == 0 {
        None
    } else {
        let total: usize = texts.iter().map(StoredText::char_len).sum();
        Some(total as f64 / count as f64)
    };
    Stats {
        count,
        earliest: texts.iter().map(|t| t.created_at).min(),
        latest: texts.iter().map(|t| t.created_at).max(),
        avg_text_length,
    }
}

/// Most recent `points` buckets, returned oldest first. `points` is
/// clamped to 1..=365.
pub fn activity(texts: &[StoredText], interval: Interval, points: i64) -> Activity {
    let points = points.clamp(1, 365) as usize;
    let mut buckets: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for text in texts {
        *buckets.entry(interval.truncate(text.created_at)).or_default() += 1;
    }

    let skip = buckets.len().saturating_sub(points);
    let series = buckets
        .into_iter()
        .skip(skip)
        .map(|(bucket, count)| ActivityPoint { bucket, count })
        .collect();
    Activity { series, interval }
}

/// Equal-width histogram of text lengths over `[min, max + 1)`.
///
/// `bins` is clamped to 2..=50. Buckets are numbered from 1 and only
/// non-empty buckets are returned.
pub fn length_histogram(texts: &[StoredText], bins: i64) -> LengthHistogram {
    let bins = bins.clamp(2, 50) as usize;
    let lengths: Vec<usize> = texts.iter().map(StoredText::char_len).collect();
    let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
        return LengthHistogram {
            bins: Vec::new(),
            min: 0,
            max: 0,
        };
    };

    let span = max + 1 - min;
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for len in lengths {
        let bucket = (len - min) * bins / span + 1;
        *counts.entry(bucket).or_default() += 1;
    }

    LengthHistogram {
        bins: counts
            .into_iter()
            .map(|(bucket, count)| HistogramBin { bucket, count })
            .collect(),
        min,
        max,
    }
}

/// Most frequent filenames, count descending then name ascending. `limit`
/// is clamped to 1..=100.
pub fn top_filenames(texts: &[StoredText], limit: i64) -> Vec<FilenameCount> {
    let limit = limit.clamp(1, 100) as usize;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for text in texts {
        *counts.entry(text.filename.as_deref().unwrap_or(NO_FILENAME)).or_default() += 1;
    }

    let mut top: Vec<FilenameCount> = counts
        .into_iter()
        .map(|(name, count)| FilenameCount {
            name: name.to_string(),
            count,
        })
        .collect();
    // BTreeMap order is name ascending; stable sort keeps it within equal counts.
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(limit);
    top
}

/// Analytics over the stored collection.
pub struct AnalyticsService {
    db: DbContext,
}

impl AnalyticsService {
    pub fn new(db: DbContext) -> Self {
        Self { db }
    }

    async fn texts(&self, project_id: Option<i32>) -> ServiceResult<Vec<StoredText>> {
        Ok(self.db.texts().list(project_id).await?)
    }

    pub async fn stats(&self, project_id: Option<i32>) -> ServiceResult<Stats> {
        Ok(stats(&self.texts(project_id).await?))
    }

    /// Every project with its text count, count descending then name ascending.
    pub async fn project_counts(&self) -> ServiceResult<Vec<ProjectCount>> {
        let mut counts: Vec<ProjectCount> = self
            .db
            .projects()
            .text_counts()
            .await?
            .into_iter()
            .map(|(project, count)| ProjectCount {
                id: project.id,
                name: project.name,
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(counts)
    }

    pub async fn activity(&self, project_id: Option<i32>, interval: Interval, points: i64) -> ServiceResult<Activity> {
        Ok(activity(&self.texts(project_id).await?, interval, points))
    }

    pub async fn length_histogram(&self, project_id: Option<i32>, bins: i64) -> ServiceResult<LengthHistogram> {
        Ok(length_histogram(&self.texts(project_id).await?, bins))
    }

    pub async fn top_filenames(&self, project_id: Option<i32>, limit: i64) -> ServiceResult<Vec<FilenameCount>> {
        Ok(top_filenames(&self.texts(project_id).await?, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: i32, body: &str, filename: Option<&str>, created_at: &str) -> StoredText {
        StoredText {
            id,
            filename: filename.map(str::to_string),
            text: body.to_string(),
            created_at: DateTime::parse_from_rfc3339(created_at).unwrap().with_timezone(&Utc),
            provider: "openai".to_string(),
            project_id: None,
            embedding: None,
        }
    }

    #[test]
    fn test_stats() {
        let texts = vec![
            text(1, "abcd", None, "2024-01-02T10:00:00Z"),
            text(2, "ab", None, "2024-01-01T10:00:00Z"),
        ];
        let s = stats(&texts);
        assert_eq!(s.count, 2);
        assert_eq!(s.avg_text_length, Some(3.0));
        assert_eq!(s.earliest, Some(texts[1].created_at));
        assert_eq!(s.latest, Some(texts[0].created_at));

        let empty = stats(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.avg_text_length, None);
        assert_eq!(empty.earliest, None);
    }

    #[test]
    fn test_interval_truncation() {
        let ts = DateTime::parse_from_rfc3339("2024-05-16T13:45:12Z").unwrap().with_timezone(&Utc);
        assert_eq!(Interval::Hour.truncate(ts).to_rfc3339(), "2024-05-16T13:00:00+00:00");
        assert_eq!(Interval::Day.truncate(ts).to_rfc3339(), "2024-05-16T00:00:00+00:00");
        // 2024-05-16 is a Thursday.
        assert_eq!(Interval::Week.truncate(ts).to_rfc3339(), "2024-05-13T00:00:00+00:00");
        assert_eq!(Interval::Month.truncate(ts).to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(Interval::parse(Some("fortnight")), Interval::Day);
    }

    #[test]
    fn test_activity_keeps_most_recent_points_oldest_first() {
        let texts = vec![
            text(1, "a", None, "2024-01-01T08:00:00Z"),
            text(2, "a", None, "2024-01-02T08:00:00Z"),
            text(3, "a", None, "2024-01-02T09:00:00Z"),
            text(4, "a", None, "2024-01-03T08:00:00Z"),
        ];
        let result = activity(&texts, Interval::Day, 2);
        let counts: Vec<_> = result.series.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(result.series[0].bucket.day(), 2);

        assert_eq!(activity(&texts, Interval::Day, 0).series.len(), 1);
    }

    #[test]
    fn test_length_histogram_buckets() {
        let texts: Vec<_> = [0usize, 5, 9, 10]
            .iter()
            .enumerate()
            .map(|(i, n)| text(i as i32, &"x".repeat(*n), None, "2024-01-01T00:00:00Z"))
            .collect();

        // Range [0, 11) split into 2 bins: [0, 5.5) and [5.5, 11).
        let hist = length_histogram(&texts, 1);
        assert_eq!(hist.min, 0);
        assert_eq!(hist.max, 10);
        assert_eq!(
            hist.bins,
            vec![
                HistogramBin { bucket: 1, count: 2 },
                HistogramBin { bucket: 2, count: 2 },
            ]
        );

        let empty = length_histogram(&[], 10);
        assert!(empty.bins.is_empty());
        assert_eq!((empty.min, empty.max), (0, 0));
    }

    #[test]
    fn test_top_filenames_order() {
        let texts = vec![
            text(1, "a", Some("b.png"), "2024-01-01T00:00:00Z"),
            text(2, "a", Some("a.png"), "2024-01-01T00:00:00Z"),
            text(3, "a", None, "2024-01-01T00:00:00Z"),
            text(4, "a", None, "2024-01-01T00:00:00Z"),
        ];
        let top = top_filenames(&texts, 10);
        let names: Vec<_> = top.iter().map(|f| (f.name.as_str(), f.count)).collect();
        assert_eq!(names, vec![("(none)", 2), ("a.png", 1), ("b.png", 1)]);

        assert_eq!(top_filenames(&texts, 0).len(), 1);
    }
}
