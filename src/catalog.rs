// src/catalog.rs

//! The test catalog: bundled fixtures, database seeding and lookups.

use std::collections::HashMap;

use sqlx::{SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::test::{QuestionRow, Test, TestRow},
};

/// Catalog shipped with the crate. Used to seed the database and as the
/// client's offline fallback.
const BUNDLED_CATALOG: &str = include_str!("../fixtures/tests.json");

/// Parses a catalog document and checks every test in it.
pub fn parse_catalog(raw: &str) -> Result<Vec<Test>, AppError> {
    let tests: Vec<Test> = serde_json::from_str(raw)?;
    for test in &tests {
        test.check().map_err(AppError::BadRequest)?;
    }
    Ok(tests)
}

/// The bundled catalog.
pub fn bundled() -> Vec<Test> {
    // Covered by the `bundled_catalog_is_valid` test.
    parse_catalog(BUNDLED_CATALOG).unwrap_or_default()
}

/// Test id -> title, as used by the analytics helpers.
pub fn titles(tests: &[Test]) -> HashMap<i64, String> {
    tests.iter().map(|t| (t.id, t.title.clone())).collect()
}

/// Inserts the catalog when the `tests` table is empty.
///
/// Returns the number of tests written.
pub async fn seed(pool: &SqlitePool, tests: &[Test]) -> Result<usize, AppError> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tests")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::debug!("Catalog already present ({} tests), skipping seed", existing);
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for test in tests {
        insert_test(&mut tx, test).await?;
    }
    tx.commit().await?;

    tracing::info!("Seeded {} tests", tests.len());
    Ok(tests.len())
}

/// Writes one test and its questions. Question order is kept in `position`.
pub async fn insert_test(
    conn: &mut sqlx::SqliteConnection,
    test: &Test,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO tests (id, title, description, created_at) VALUES (?, ?, ?, ?)")
        .bind(test.id)
        .bind(&test.title)
        .bind(&test.description)
        .bind(chrono::Utc::now())
        .execute(&mut *conn)
        .await?;

    for (position, q) in test.questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO questions (test_id, id, position, text, options, correct_answer)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(test.id)
        .bind(q.id)
        .bind(position as i64)
        .bind(&q.text)
        .bind(Json(&q.options))
        .bind(q.correct_answer)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Loads every test with its questions, ordered by test id then question position.
pub async fn load_all(pool: &SqlitePool) -> Result<Vec<Test>, AppError> {
    let rows: Vec<TestRow> =
        sqlx::query_as("SELECT id, title, description FROM tests ORDER BY id ASC")
            .fetch_all(pool)
            .await?;

    let questions: Vec<QuestionRow> = sqlx::query_as(
        r#"
        SELECT test_id, id, text, options, correct_answer
        FROM questions
        ORDER BY test_id ASC, position ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_test: HashMap<i64, Vec<QuestionRow>> = HashMap::new();
    for q in questions {
        by_test.entry(q.test_id).or_default().push(q);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let questions = by_test.remove(&row.id).unwrap_or_default();
            Test::from_rows(row, questions)
        })
        .collect())
}

/// Loads a single test, or `None` when it does not exist.
pub async fn load_one(pool: &SqlitePool, id: i64) -> Result<Option<Test>, AppError> {
    let row: Option<TestRow> =
        sqlx::query_as("SELECT id, title, description FROM tests WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let questions: Vec<QuestionRow> = sqlx::query_as(
        r#"
        SELECT test_id, id, text, options, correct_answer
        FROM questions
        WHERE test_id = ?
        ORDER BY position ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(Test::from_rows(row, questions)))
}

/// Test id -> title for every stored test.
pub async fn load_titles(pool: &SqlitePool) -> Result<HashMap<i64, String>, AppError> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, title FROM tests")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_is_valid() {
        let tests = parse_catalog(BUNDLED_CATALOG).expect("bundled catalog parses");
        assert_eq!(tests.len(), 5);
        assert_eq!(bundled(), tests);
        assert!(tests.iter().all(|t| !t.questions.is_empty()));
    }

    #[test]
    fn invalid_catalog_is_rejected() {
        let raw = r#"[{"id": 1, "title": "T", "description": "",
            "questions": [{"id": 1, "text": "?", "options": ["a"], "correctAnswer": 4}]}]"#;
        assert!(matches!(parse_catalog(raw), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn seed_is_idempotent_and_round_trips() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let catalog = bundled();
        assert_eq!(seed(&pool, &catalog).await.unwrap(), catalog.len());
        assert_eq!(seed(&pool, &catalog).await.unwrap(), 0);

        let loaded = load_all(&pool).await.unwrap();
        assert_eq!(loaded, catalog);

        let physics = load_one(&pool, 4).await.unwrap().unwrap();
        assert_eq!(physics.title, "Physics");
        assert!(load_one(&pool, 404).await.unwrap().is_none());
        assert_eq!(load_titles(&pool).await.unwrap().len(), catalog.len());
    }
}
