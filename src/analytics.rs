//! Performance analytics over test attempts.
//!
//! Shared by the `/tests/performance` handler, the feedback generator and the
//! client's local mode, so every surface ranks subjects the same way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The part of an attempt the aggregation needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSample {
    pub test_id: i64,
    pub score: i64,
    pub total_questions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeakArea {
    pub test_id: i64,
    pub title: String,
    /// Ratio in `0.0..=1.0`.
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_tests: usize,
    /// Ratio in `0.0..=1.0` over every counted attempt.
    pub average_score: f64,
    pub weakest_areas: Vec<WeakArea>,
}

impl PerformanceReport {
    pub fn empty() -> Self {
        Self {
            total_tests: 0,
            average_score: 0.0,
            weakest_areas: Vec::new(),
        }
    }
}

/// Per-subject totals, in order of the subject's first attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectPerformance {
    pub test_id: i64,
    pub title: String,
    pub total_score: i64,
    pub total_questions: i64,
    pub attempts: usize,
}

impl SubjectPerformance {
    pub fn ratio(&self) -> f64 {
        ratio(self.total_score, self.total_questions)
    }

    pub fn percentage(&self) -> f64 {
        self.ratio() * 100.0
    }
}

fn ratio(score: i64, total: i64) -> f64 {
    if total > 0 {
        score as f64 / total as f64
    } else {
        0.0
    }
}

/// Keeps only samples for the given test ids. `None` keeps everything.
pub fn filter_samples(samples: &[ScoreSample], test_ids: Option<&[i64]>) -> Vec<ScoreSample> {
    match test_ids {
        Some(ids) => samples
            .iter()
            .filter(|s| ids.contains(&s.test_id))
            .copied()
            .collect(),
        None => samples.to_vec(),
    }
}

/// Groups samples by test id. Subjects missing from `titles` are left out.
pub fn subject_performance(
    samples: &[ScoreSample],
    titles: &HashMap<i64, String>,
) -> Vec<SubjectPerformance> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut subjects: Vec<SubjectPerformance> = Vec::new();

    for sample in samples {
        let Some(title) = titles.get(&sample.test_id) else {
            continue;
        };
        let slot = *index.entry(sample.test_id).or_insert_with(|| {
            subjects.push(SubjectPerformance {
                test_id: sample.test_id,
                title: title.clone(),
                total_score: 0,
                total_questions: 0,
                attempts: 0,
            });
            subjects.len() - 1
        });
        let subject = &mut subjects[slot];
        subject.total_score += sample.score;
        subject.total_questions += sample.total_questions;
        subject.attempts += 1;
    }

    subjects
}

/// Overall ratio `sum(score) / sum(total_questions)`.
pub fn overall_ratio(samples: &[ScoreSample]) -> f64 {
    let score: i64 = samples.iter().map(|s| s.score).sum();
    let total: i64 = samples.iter().map(|s| s.total_questions).sum();
    ratio(score, total)
}

/// Builds the performance report, keeping the `limit` lowest-scoring subjects.
///
/// Ties keep first-appearance order.
pub fn analyze(
    samples: &[ScoreSample],
    titles: &HashMap<i64, String>,
    limit: usize,
) -> PerformanceReport {
    if samples.is_empty() {
        return PerformanceReport::empty();
    }

    let mut subjects = subject_performance(samples, titles);
    subjects.sort_by(|a, b| a.ratio().total_cmp(&b.ratio()));

    let weakest_areas = subjects
        .into_iter()
        .take(limit)
        .map(|s| WeakArea {
            average_score: s.ratio(),
            test_id: s.test_id,
            title: s.title,
        })
        .collect();

    PerformanceReport {
        total_tests: samples.len(),
        average_score: overall_ratio(samples),
        weakest_areas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(test_id: i64, score: i64, total: i64) -> ScoreSample {
        ScoreSample {
            test_id,
            score,
            total_questions: total,
        }
    }

    fn titles() -> HashMap<i64, String> {
        HashMap::from([
            (1, "Subject A".to_string()),
            (2, "Subject B".to_string()),
            (3, "Subject C".to_string()),
            (4, "Subject D".to_string()),
        ])
    }

    #[test]
    fn averages_by_subject_and_ranks_weakest() {
        let samples = [sample(1, 8, 10), sample(1, 6, 10), sample(2, 2, 10)];

        let subjects = subject_performance(&samples, &titles());
        assert_eq!(subjects.len(), 2);
        assert!((subjects[0].ratio() - 0.70).abs() < 1e-9);
        assert!((subjects[1].ratio() - 0.20).abs() < 1e-9);

        let report = analyze(&samples, &titles(), 1);
        assert_eq!(report.total_tests, 3);
        assert!((report.average_score - 16.0 / 30.0).abs() < 1e-9);
        assert_eq!(report.weakest_areas.len(), 1);
        assert_eq!(report.weakest_areas[0].test_id, 2);
        assert_eq!(report.weakest_areas[0].title, "Subject B");
        assert!((report.weakest_areas[0].average_score - 0.20).abs() < 1e-9);
    }

    #[test]
    fn zero_attempts_yield_empty_report() {
        let report = analyze(&[], &titles(), 3);
        assert_eq!(report, PerformanceReport::empty());

        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "totalTests": 0, "averageScore": 0.0, "weakestAreas": [] })
        );
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let samples = [
            sample(3, 5, 10),
            sample(1, 9, 10),
            sample(2, 1, 2),
            sample(4, 5, 10),
        ];
        let report = analyze(&samples, &titles(), 3);
        let ids: Vec<i64> = report.weakest_areas.iter().map(|w| w.test_id).collect();
        assert_eq!(ids, vec![3, 2, 4]);
    }

    #[test]
    fn unknown_subjects_count_in_totals_but_are_not_ranked() {
        let samples = [sample(99, 0, 10), sample(1, 5, 10)];
        let report = analyze(&samples, &titles(), 3);
        assert_eq!(report.total_tests, 2);
        assert!((report.average_score - 0.25).abs() < 1e-9);
        assert_eq!(report.weakest_areas.len(), 1);
        assert_eq!(report.weakest_areas[0].test_id, 1);
    }

    #[test]
    fn filter_keeps_requested_tests_only() {
        let samples = [sample(1, 1, 2), sample(2, 2, 2), sample(3, 0, 2)];
        let kept = filter_samples(&samples, Some(&[1, 3]));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|s| s.test_id != 2));
        assert_eq!(filter_samples(&samples, None).len(), 3);
    }
}
