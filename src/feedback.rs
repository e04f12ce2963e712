//! Canned study feedback derived from a user's attempts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::analytics::{self, ScoreSample, SubjectPerformance};

/// Subjects at or above this percentage may be listed as strengths,
/// subjects below it as weaknesses.
pub const STRENGTH_THRESHOLD: f64 = 60.0;

/// How many subjects each of the strength and weakness lists can hold.
pub const AREA_LIMIT: usize = 2;

const NO_DATA_OVERVIEW: &str =
    "You haven't taken any tests yet. Start practicing to get personalized feedback!";
const NO_DATA_RECOMMENDATION: &str =
    "Begin by taking a few tests to establish your baseline knowledge.";
const DAILY_PRACTICE: &str = "Set aside 30-60 minutes every day for exam preparation.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Feedback {
    pub overview: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Feedback {
    pub fn no_data() -> Self {
        Self {
            overview: NO_DATA_OVERVIEW.to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            recommendations: vec![NO_DATA_RECOMMENDATION.to_string()],
        }
    }

    /// Returned by clients when the feedback service cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            overview: "The feedback service is unavailable right now. Please try again later."
                .to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            recommendations: vec!["Check your internet connection.".to_string()],
        }
    }
}

/// Performance band of an average percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Developing,
    Progressing,
    Proficient,
    Excellent,
}

impl Band {
    pub fn of(percentage: f64) -> Self {
        if percentage < 50.0 {
            Band::Developing
        } else if percentage < 70.0 {
            Band::Progressing
        } else if percentage < 90.0 {
            Band::Proficient
        } else {
            Band::Excellent
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Band::Developing => {
                "You're still developing your knowledge in many areas. Focus on building a strong foundation in the basics."
            }
            Band::Progressing => {
                "You're showing good progress but have room for improvement in several areas."
            }
            Band::Proficient => {
                "You're performing well across most tests with a few areas that could use additional focus."
            }
            Band::Excellent => {
                "Excellent work! You're demonstrating mastery across most subject areas."
            }
        }
    }

    fn advice(self) -> [&'static str; 2] {
        match self {
            Band::Developing => [
                "Focus on improving your basic understanding in the weak areas.",
                "Consider reviewing foundational concepts before proceeding to more complex topics.",
            ],
            Band::Progressing => [
                "Continue practicing in your weaker areas to strengthen your knowledge.",
                "Try more varied test types to broaden your understanding.",
            ],
            Band::Proficient | Band::Excellent => [
                "Challenge yourself with more difficult tests to further enhance your skills.",
                "Consider helping others or explaining concepts to solidify your understanding.",
            ],
        }
    }
}

fn area_line(subject: &SubjectPerformance) -> String {
    format!(
        "{}: {:.1}% ({}/{})",
        subject.title,
        subject.percentage(),
        subject.total_score,
        subject.total_questions
    )
}

/// Builds feedback for one user.
///
/// `full_name` personalises the overview when present. Attempts for subjects
/// missing from `titles` are ignored.
pub fn generate(
    full_name: Option<&str>,
    samples: &[ScoreSample],
    titles: &HashMap<i64, String>,
) -> Feedback {
    let subjects = analytics::subject_performance(samples, titles);
    if subjects.is_empty() {
        return Feedback::no_data();
    }

    let score: i64 = subjects.iter().map(|s| s.total_score).sum();
    let total: i64 = subjects.iter().map(|s| s.total_questions).sum();
    let percentage = if total > 0 {
        score as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let band = Band::of(percentage);

    let mut ranked: Vec<&SubjectPerformance> = subjects.iter().collect();
    ranked.sort_by(|a, b| b.ratio().total_cmp(&a.ratio()));

    let strengths: Vec<&SubjectPerformance> = ranked
        .iter()
        .take(AREA_LIMIT)
        .filter(|s| s.percentage() >= STRENGTH_THRESHOLD)
        .copied()
        .collect();
    // Bottom of the ranking, still best-first.
    let weaknesses: Vec<&SubjectPerformance> = ranked[ranked.len().saturating_sub(AREA_LIMIT)..]
        .iter()
        .filter(|s| s.percentage() < STRENGTH_THRESHOLD)
        .copied()
        .collect();

    let greeting = match full_name {
        Some(name) if !name.trim().is_empty() => format!("{}, your", name.trim()),
        _ => "Your".to_string(),
    };
    let overview = format!(
        "{} average score is {:.2}% across {} subject(s) and {} question(s). {}",
        greeting,
        percentage,
        subjects.len(),
        total,
        band.summary()
    );

    let mut recommendations: Vec<String> =
        band.advice().iter().map(|line| line.to_string()).collect();
    for weak in &weaknesses {
        recommendations.push(format!("Dedicate more study time to {}.", weak.title));
    }
    if let Some(best) = strengths.first() {
        recommendations.push(format!(
            "You're doing well in {}. Keep up that level.",
            best.title
        ));
    }
    recommendations.push(DAILY_PRACTICE.to_string());

    Feedback {
        overview,
        strengths: strengths.iter().map(|s| area_line(s)).collect(),
        weaknesses: weaknesses.iter().map(|s| area_line(s)).collect(),
        recommendations,
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
            (1, "Physics".to_string()),
            (2, "Informatics".to_string()),
            (3, "History".to_string()),
        ])
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(Band::of(0.0), Band::Developing);
        assert_eq!(Band::of(49.99), Band::Developing);
        assert_eq!(Band::of(50.0), Band::Progressing);
        assert_eq!(Band::of(69.9), Band::Progressing);
        assert_eq!(Band::of(70.0), Band::Proficient);
        assert_eq!(Band::of(89.9), Band::Proficient);
        assert_eq!(Band::of(90.0), Band::Excellent);
    }

    #[test]
    fn no_attempts_gives_canned_feedback() {
        assert_eq!(generate(Some("Aida"), &[], &titles()), Feedback::no_data());
    }

    #[test]
    fn splits_strengths_and_weaknesses() {
        let samples = [sample(1, 9, 10), sample(2, 3, 10), sample(3, 7, 10)];
        let feedback = generate(Some("Aida"), &samples, &titles());

        assert!(feedback.overview.starts_with("Aida, your average score is 63.33%"));
        assert_eq!(
            feedback.strengths,
            vec!["Physics: 90.0% (9/10)", "History: 70.0% (7/10)"]
        );
        assert_eq!(feedback.weaknesses, vec!["Informatics: 30.0% (3/10)"]);
        assert!(
            feedback
                .recommendations
                .contains(&"Dedicate more study time to Informatics.".to_string())
        );
        assert!(
            feedback
                .recommendations
                .contains(&"You're doing well in Physics. Keep up that level.".to_string())
        );
        assert_eq!(feedback.recommendations.last().unwrap(), DAILY_PRACTICE);
    }

    #[test]
    fn excellent_overview_without_name() {
        let samples = [sample(1, 10, 10)];
        let feedback = generate(None, &samples, &titles());
        assert!(feedback.overview.starts_with("Your average score is 100.00%"));
        assert!(feedback.overview.ends_with(Band::Excellent.summary()));
        assert!(feedback.weaknesses.is_empty());
    }

    #[test]
    fn weaknesses_keep_descending_order() {
        let samples = [sample(1, 2, 10), sample(2, 4, 10), sample(3, 9, 10)];
        let feedback = generate(None, &samples, &titles());
        assert_eq!(
            feedback.weaknesses,
            vec!["Informatics: 40.0% (4/10)", "Physics: 20.0% (2/10)"]
        );
        assert_eq!(feedback.strengths, vec!["History: 90.0% (9/10)"]);
        let dedicate: Vec<&String> = feedback
            .recommendations
            .iter()
            .filter(|r| r.starts_with("Dedicate"))
            .collect();
        assert_eq!(
            dedicate,
            vec![
                "Dedicate more study time to Informatics.",
                "Dedicate more study time to Physics."
            ]
        );
    }
}
