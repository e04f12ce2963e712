// src/models/test.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use utoipa::ToSchema;

/// Represents the 'tests' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct TestRow {
    pub id: i64,
    pub title: String,
    pub description: String,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub test_id: i64,
    pub id: i64,
    pub text: String,

    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Index into `options`.
    pub correct_answer: i64,
}

/// A single multiple-choice question as exchanged with clients
/// and stored in catalog fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            options: row.options.0,
            correct_answer: row.correct_answer,
        }
    }
}

/// A subject test with its ordered questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Test {
    pub fn from_rows(row: TestRow, questions: Vec<QuestionRow>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            questions: questions.into_iter().map(Question::from).collect(),
        }
    }

    /// Checks that every question has options and a correct answer inside them,
    /// and that question ids are unique within the test.
    pub fn check(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id) {
                return Err(format!("test {}: duplicate question id {}", self.id, q.id));
            }
            if q.options.is_empty() {
                return Err(format!("test {}: question {} has no options", self.id, q.id));
            }
            if q.correct_answer < 0 || q.correct_answer as usize >= q.options.len() {
                return Err(format!(
                    "test {}: question {} answer index {} out of range",
                    self.id, q.id, q.correct_answer
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, correct: i64) -> Question {
        Question {
            id,
            text: "?".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer: correct,
        }
    }

    #[test]
    fn check_rejects_out_of_range_answer() {
        let test = Test {
            id: 1,
            title: "Physics".into(),
            description: String::new(),
            questions: vec![question(1, 0), question(2, 2)],
        };
        assert!(test.check().unwrap_err().contains("out of range"));
    }

    #[test]
    fn check_rejects_duplicate_ids() {
        let test = Test {
            id: 1,
            title: "Physics".into(),
            description: String::new(),
            questions: vec![question(1, 0), question(1, 1)],
        };
        assert!(test.check().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn serializes_camel_case() {
        let body = serde_json::to_value(question(3, 1)).unwrap();
        assert_eq!(body["correctAnswer"], 1);
    }
}
