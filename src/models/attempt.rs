// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Represents the 'test_attempts' table in the database.
/// One completed test by one user; rows are never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,

    /// When the user finished the test, as reported by the client.
    pub date: DateTime<Utc>,

    pub score: i64,
    pub total_questions: i64,

    /// Chosen option index per question. Empty for history entries.
    #[schema(value_type = Vec<i64>)]
    pub answers: Json<Vec<i64>>,

    pub created_at: DateTime<Utc>,
}

/// DTO for `POST /tests/results`.
///
/// `answers[i]` is the option chosen for `question_ids[i]` when the client
/// sampled a subset of the test, otherwise for the i-th question of the test.
/// `score` is accepted for compatibility but recomputed server-side.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_answer_alignment))]
pub struct SubmitResultRequest {
    pub test_id: i64,
    #[serde(default)]
    pub score: Option<i64>,
    #[validate(length(min = 1, message = "At least one answer is required"))]
    pub answers: Vec<i64>,
    #[serde(default)]
    pub question_ids: Option<Vec<i64>>,
    pub date: DateTime<Utc>,
}

fn validate_answer_alignment(req: &SubmitResultRequest) -> Result<(), ValidationError> {
    match &req.question_ids {
        Some(ids) if ids.len() != req.answers.len() => {
            let mut err = ValidationError::new("answers_mismatch");
            err.message = Some("answers and questionIds must have the same length".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// DTO for `POST /auth/test-history`: a finished attempt without answers.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_score_bounds))]
pub struct HistoryEntryRequest {
    pub test_id: i64,
    pub date: DateTime<Utc>,
    #[validate(range(min = 0, message = "Score cannot be negative"))]
    pub score: i64,
    #[validate(range(min = 1, message = "totalQuestions must be at least 1"))]
    pub total_questions: i64,
}

fn validate_score_bounds(req: &HistoryEntryRequest) -> Result<(), ValidationError> {
    if req.score > req.total_questions {
        let mut err = ValidationError::new("score_out_of_bounds");
        err.message = Some("score cannot exceed totalQuestions".into());
        return Err(err);
    }
    Ok(())
}

/// Graded outcome of `POST /tests/results`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultResponse {
    pub success: bool,
    pub score: i64,
    pub total_questions: i64,
}

/// Query parameters for `GET /tests/performance`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PerformanceParams {
    /// Comma-separated test ids, e.g. `1,3,5`.
    #[serde(rename = "testIds")]
    pub test_ids: Option<String>,
}

impl PerformanceParams {
    /// Parses the `testIds` filter. Blank input means no filter.
    pub fn parse_ids(&self) -> Result<Option<Vec<i64>>, String> {
        let Some(raw) = self.test_ids.as_deref() else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        raw.split(',')
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid test id '{}'", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(score: i64, total: i64) -> HistoryEntryRequest {
        HistoryEntryRequest {
            test_id: 1,
            date: Utc::now(),
            score,
            total_questions: total,
        }
    }

    #[test]
    fn score_above_total_is_rejected() {
        assert!(history(7, 10).validate().is_ok());
        assert!(history(10, 10).validate().is_ok());
        assert!(history(11, 10).validate().is_err());
        assert!(history(0, 0).validate().is_err());
    }

    #[test]
    fn question_ids_must_align_with_answers() {
        let req = SubmitResultRequest {
            test_id: 1,
            score: None,
            answers: vec![0, 1, 2],
            question_ids: Some(vec![4, 5]),
            date: Utc::now(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn parses_test_id_filter() {
        let params = PerformanceParams { test_ids: Some("1, 3,5".into()) };
        assert_eq!(params.parse_ids().unwrap(), Some(vec![1, 3, 5]));

        let empty = PerformanceParams { test_ids: Some("  ".into()) };
        assert_eq!(empty.parse_ids().unwrap(), None);

        let bad = PerformanceParams { test_ids: Some("1,x".into()) };
        assert!(bad.parse_ids().is_err());
    }

    #[test]
    fn submit_request_reads_camel_case() {
        let req: SubmitResultRequest = serde_json::from_value(serde_json::json!({
            "testId": 2,
            "score": 3,
            "answers": [1, 0],
            "date": "2025-04-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(req.test_id, 2);
        assert_eq!(req.question_ids, None);
    }
}
