//! Shapes the client keeps in its store and exchanges with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{analytics::ScoreSample, config::QUESTIONS_PER_TEST, models::test::Test};

/// One finished test in a user's history (no answers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub test_id: i64,
    pub date: DateTime<Utc>,
    pub score: i64,
    pub total_questions: i64,
}

impl From<&HistoryEntry> for ScoreSample {
    fn from(entry: &HistoryEntry) -> Self {
        ScoreSample {
            test_id: entry.test_id,
            score: entry.score,
            total_questions: entry.total_questions,
        }
    }
}

/// The logged-in user blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub test_history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// A demo account bundled for local-mode login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoUser {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub test_history: Vec<HistoryEntry>,
}

impl From<DemoUser> for StoredUser {
    fn from(user: DemoUser) -> Self {
        StoredUser {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            test_history: user.test_history,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
}

/// Recorded for a question left blank; never a valid option index.
pub const UNANSWERED: i64 = -1;

/// A submitted test, as stored locally and sent to `POST /tests/results`.
///
/// Backend result listings carry `totalQuestions`; local results may not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_id: i64,
    pub score: i64,
    #[serde(default)]
    pub answers: Vec<i64>,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<i64>,
}

impl TestResult {
    /// Builds a result for `test` as it was shown, `answers[i]` being the
    /// option chosen for `test.questions[i]`.
    ///
    /// Question ids travel with the answers so a shuffled or sampled test is
    /// graded per question. Missing answers count as wrong.
    pub fn from_answers(test: &Test, answers: &[i64], date: DateTime<Utc>) -> Self {
        let answers: Vec<i64> = (0..test.questions.len())
            .map(|i| answers.get(i).copied().unwrap_or(UNANSWERED))
            .collect();
        let score = test
            .questions
            .iter()
            .zip(&answers)
            .filter(|(q, given)| q.correct_answer == **given)
            .count() as i64;

        TestResult {
            test_id: test.id,
            score,
            question_ids: Some(test.questions.iter().map(|q| q.id).collect()),
            total_questions: Some(test.questions.len() as i64),
            answers,
            date,
        }
    }

    /// Question count: explicit, else one per answer, else the per-test default.
    pub fn question_count(&self) -> i64 {
        match self.total_questions {
            Some(total) => total,
            None if !self.answers.is_empty() => self.answers.len() as i64,
            None => QUESTIONS_PER_TEST as i64,
        }
    }

    pub fn sample(&self) -> ScoreSample {
        ScoreSample {
            test_id: self.test_id,
            score: self.score,
            total_questions: self.question_count(),
        }
    }

    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            test_id: self.test_id,
            date: self.date,
            score: self.score,
            total_questions: self.question_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_attempt_decodes_as_result_and_history() {
        let attempt = serde_json::json!({
            "id": 4,
            "userId": 1,
            "testId": 2,
            "date": "2025-04-01T10:00:00Z",
            "score": 7,
            "totalQuestions": 10,
            "answers": [0, 1, 2, 3, 0, 1, 2, 3, 0, 1],
            "createdAt": "2025-04-01T10:00:01Z"
        });
        let result: TestResult = serde_json::from_value(attempt.clone()).unwrap();
        assert_eq!(result.question_count(), 10);
        let entry: HistoryEntry = serde_json::from_value(attempt).unwrap();
        assert_eq!(entry.score, 7);
    }

    #[test]
    fn answers_follow_the_shown_question_order() {
        use crate::models::test::Question;

        let question = |id: i64, correct_answer: i64| Question {
            id,
            text: format!("Q{}", id),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer,
        };
        // Shown shuffled: 3, 1, 2.
        let test = Test {
            id: 5,
            title: "Informatics".into(),
            description: String::new(),
            questions: vec![question(3, 2), question(1, 0), question(2, 1)],
        };

        let result = TestResult::from_answers(&test, &[2, 0], Utc::now());
        assert_eq!(result.score, 2);
        assert_eq!(result.answers, vec![2, 0, UNANSWERED]);
        assert_eq!(result.question_ids, Some(vec![3, 1, 2]));
        assert_eq!(result.question_count(), 3);
    }

    #[test]
    fn question_count_falls_back_to_answers_then_default() {
        let mut result = TestResult {
            test_id: 1,
            score: 2,
            answers: vec![0, 1, 1],
            date: Utc::now(),
            question_ids: None,
            total_questions: None,
        };
        assert_eq!(result.question_count(), 3);
        result.answers.clear();
        assert_eq!(result.question_count(), QUESTIONS_PER_TEST as i64);
    }
}
