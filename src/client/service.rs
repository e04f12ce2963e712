//! The quiz client: backend calls with local fallback.
//!
//! Each feature area follows its [`ApiMode`] switch. Reads that fail against
//! the backend fall back to the bundled catalog or to what the store holds;
//! secondary writes (remote copies of results, history sync) are logged and
//! dropped.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::Serialize;
use serde_json::Value;

use super::{
    api::{ApiClient, endpoints},
    error::ClientError,
    mode::{ApiMode, ClientSettings},
    store::{self, KeyValueStore, RESULTS_KEY, USER_KEY},
    types::{DemoUser, HistoryEntry, RegisterForm, StoredUser, TestResult},
};
use crate::{
    analytics::{self, PerformanceReport, ScoreSample},
    catalog,
    config::{QUESTIONS_PER_TEST, WEAKEST_AREAS_LIMIT},
    feedback::{self, Feedback},
    models::test::Test,
};

const DEMO_USERS: &str = include_str!("../../fixtures/users.json");

/// Tests and performance, fetched together for the landing screen.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub tests: Vec<Test>,
    pub performance: PerformanceReport,
}

#[derive(Serialize)]
struct LoginCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Shuffles the questions and keeps at most `count` of them.
pub fn sample_questions<R: Rng + ?Sized>(test: &Test, count: usize, rng: &mut R) -> Test {
    let mut sampled = test.clone();
    sampled.questions.shuffle(rng);
    sampled.questions.truncate(count);
    sampled
}

pub struct QuizClient {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    mode: ApiMode,
    catalog: Vec<Test>,
    demo_users: Vec<DemoUser>,
}

impl QuizClient {
    pub fn new(
        settings: ClientSettings,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let demo_users: Vec<DemoUser> = serde_json::from_str(DEMO_USERS)
            .map_err(|e| ClientError::Decode(format!("bundled users: {}", e)))?;
        Ok(Self {
            api: ApiClient::new(&settings)?,
            store,
            mode: settings.mode,
            catalog: catalog::bundled(),
            demo_users,
        })
    }

    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    /// The catalog shipped with the client.
    pub fn bundled_tests(&self) -> &[Test] {
        &self.catalog
    }

    async fn stored_user(&self) -> Result<Option<StoredUser>, ClientError> {
        store::load(self.store.as_ref(), USER_KEY).await
    }

    async fn token(&self) -> Option<String> {
        match self.stored_user().await {
            Ok(user) => user.and_then(|u| u.token),
            Err(e) => {
                tracing::warn!("Could not read stored session: {}", e);
                None
            }
        }
    }

    async fn local_results(&self) -> Vec<TestResult> {
        match store::load::<Vec<TestResult>>(self.store.as_ref(), RESULTS_KEY).await {
            Ok(results) => results.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Could not read stored results: {}", e);
                Vec::new()
            }
        }
    }

    // ---- auth ----

    pub async fn login(&self, username: &str, password: &str) -> Result<StoredUser, ClientError> {
        let user = if self.mode.auth.use_backend {
            let credentials = LoginCredentials { username, password };
            self.api
                .post::<_, StoredUser>(endpoints::LOGIN, &credentials, None)
                .await
                .map_err(|e| match e {
                    ClientError::Api { status: 401, .. } => ClientError::InvalidCredentials,
                    other => other,
                })?
        } else {
            self.demo_users
                .iter()
                .find(|u| u.username == username && u.password == password)
                .cloned()
                .map(StoredUser::from)
                .ok_or(ClientError::InvalidCredentials)?
        };

        store::save(self.store.as_ref(), USER_KEY, &user).await?;
        tracing::info!(username = %user.username, "Logged in");
        Ok(user)
    }

    /// Local mode does not persist accounts: every local registration gets the
    /// id after the last demo user.
    pub async fn register(&self, form: RegisterForm) -> Result<StoredUser, ClientError> {
        let user = if self.mode.auth.use_backend {
            self.api
                .post::<_, StoredUser>(endpoints::REGISTER, &form, None)
                .await?
        } else {
            if self.demo_users.iter().any(|u| u.username == form.username) {
                return Err(ClientError::UserExists);
            }
            StoredUser {
                id: self.demo_users.len() as i64 + 1,
                username: form.username,
                full_name: form.full_name,
                email: form.email,
                test_history: Vec::new(),
                token: None,
            }
        };

        store::save(self.store.as_ref(), USER_KEY, &user).await?;
        Ok(user)
    }

    /// Clears the local session. The backend is told when auth is remote,
    /// but its answer does not matter.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if self.mode.auth.use_backend {
            if let Some(token) = self.token().await {
                if let Err(e) = self
                    .api
                    .post_empty::<Value>(endpoints::LOGOUT, Some(&token))
                    .await
                {
                    tracing::debug!("Remote logout failed, continuing: {}", e);
                }
            }
        }
        self.store.remove(USER_KEY).await
    }

    /// The stored session, if any.
    pub async fn current_user(&self) -> Result<Option<StoredUser>, ClientError> {
        self.stored_user().await
    }

    /// Re-fetches the profile from the backend, keeping the stored token.
    /// Falls back to the stored user when the call fails.
    pub async fn refresh_current_user(&self) -> Result<Option<StoredUser>, ClientError> {
        let stored = self.stored_user().await?;
        if !self.mode.auth.use_backend {
            return Ok(stored);
        }
        let Some(token) = stored.as_ref().and_then(|u| u.token.clone()) else {
            return Ok(stored);
        };

        match self
            .api
            .get::<StoredUser>(endpoints::CURRENT_USER, Some(&token))
            .await
        {
            Ok(mut user) => {
                user.token = Some(token);
                store::save(self.store.as_ref(), USER_KEY, &user).await?;
                Ok(Some(user))
            }
            Err(e) => {
                tracing::warn!("Profile refresh failed, using stored user: {}", e);
                Ok(stored)
            }
        }
    }

    /// Appends to the stored history, then mirrors to the backend when both
    /// auth and tests are remote.
    pub async fn update_test_history(&self, entry: HistoryEntry) -> Result<(), ClientError> {
        let mut user = self.stored_user().await?.ok_or(ClientError::NotLoggedIn)?;
        user.test_history.push(entry.clone());
        store::save(self.store.as_ref(), USER_KEY, &user).await?;

        if self.mode.auth.use_backend && self.mode.tests.use_backend {
            let result = self
                .api
                .post::<_, Value>(endpoints::TEST_HISTORY, &entry, user.token.as_deref())
                .await;
            if let Err(e) = result {
                tracing::warn!("Remote history update failed, kept locally: {}", e);
            }
        }
        Ok(())
    }

    // ---- tests ----

    pub async fn tests(&self) -> Vec<Test> {
        if self.mode.tests.use_backend {
            let token = self.token().await;
            match self.api.get::<Vec<Test>>(endpoints::TESTS, token.as_deref()).await {
                Ok(tests) => return tests,
                Err(e) => tracing::warn!("Loading tests failed, using bundled data: {}", e),
            }
        }
        self.catalog.clone()
    }

    /// One test with up to [`QUESTIONS_PER_TEST`] questions in random order.
    pub async fn test(&self, id: i64) -> Option<Test> {
        let full = if self.mode.tests.use_backend {
            let token = self.token().await;
            match self.api.get::<Test>(&endpoints::test(id), token.as_deref()).await {
                Ok(test) => Some(test),
                Err(e) => {
                    tracing::warn!("Loading test {} failed, using bundled data: {}", id, e);
                    self.catalog.iter().find(|t| t.id == id).cloned()
                }
            }
        } else {
            self.catalog.iter().find(|t| t.id == id).cloned()
        };

        full.map(|test| sample_questions(&test, QUESTIONS_PER_TEST, &mut rand::thread_rng()))
    }

    /// Saves a result locally, then to the backend when tests are remote.
    ///
    /// Succeeds when at least one copy was written.
    pub async fn save_result(&self, result: TestResult) -> Result<(), ClientError> {
        let mut results = self.local_results().await;
        results.push(result.clone());
        let local = store::save(self.store.as_ref(), RESULTS_KEY, &results).await;
        if let Err(e) = &local {
            tracing::error!("Saving result locally failed: {}", e);
        }

        if self.mode.tests.use_backend {
            let token = self.token().await;
            match self
                .api
                .post::<_, Value>(endpoints::RESULTS, &result, token.as_deref())
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) => tracing::warn!("Remote result save failed: {}", e),
            }
        }
        local
    }

    pub async fn results(&self) -> Vec<TestResult> {
        if self.mode.tests.use_backend {
            let token = self.token().await;
            match self
                .api
                .get::<Vec<TestResult>>(endpoints::RESULTS, token.as_deref())
                .await
            {
                Ok(results) => return results,
                Err(e) => tracing::warn!("Loading results failed, using local copy: {}", e),
            }
        }
        self.local_results().await
    }

    pub async fn results_for_test(&self, test_id: i64) -> Vec<TestResult> {
        if self.mode.tests.use_backend {
            let token = self.token().await;
            match self
                .api
                .get::<Vec<TestResult>>(&endpoints::test_results(test_id), token.as_deref())
                .await
            {
                Ok(results) => return results,
                Err(e) => tracing::warn!("Loading results for test {} failed: {}", test_id, e),
            }
        }
        self.local_results()
            .await
            .into_iter()
            .filter(|r| r.test_id == test_id)
            .collect()
    }

    /// Performance report from the backend, or computed from local results.
    pub async fn analyze_performance(&self, test_ids: Option<&[i64]>) -> PerformanceReport {
        if self.mode.tests.use_backend {
            let token = self.token().await;
            let query: Vec<(&str, String)> = test_ids
                .map(|ids| {
                    let joined = ids
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    vec![("testIds", joined)]
                })
                .unwrap_or_default();
            match self
                .api
                .get_with_query::<PerformanceReport, _>(
                    endpoints::PERFORMANCE,
                    &query,
                    token.as_deref(),
                )
                .await
            {
                Ok(report) => return report,
                Err(e) => tracing::warn!("Performance call failed, computing locally: {}", e),
            }
        }

        let samples: Vec<ScoreSample> = self
            .local_results()
            .await
            .iter()
            .map(TestResult::sample)
            .collect();
        let samples = analytics::filter_samples(&samples, test_ids);
        analytics::analyze(&samples, &catalog::titles(&self.catalog), WEAKEST_AREAS_LIMIT)
    }

    /// Fetches tests and performance concurrently.
    pub async fn dashboard(&self) -> Dashboard {
        let (tests, performance) = tokio::join!(self.tests(), self.analyze_performance(None));
        Dashboard { tests, performance }
    }

    // ---- feedback ----

    pub async fn feedback(&self) -> Feedback {
        if self.mode.ai_helper.use_backend {
            let token = self.token().await;
            return match self
                .api
                .post_empty::<Feedback>(endpoints::FEEDBACK, token.as_deref())
                .await
            {
                Ok(feedback) => feedback,
                Err(e) => {
                    tracing::warn!("Feedback call failed: {}", e);
                    Feedback::unavailable()
                }
            };
        }

        let user = match self.stored_user().await {
            Ok(Some(user)) => user,
            Ok(None) => return Feedback::no_data(),
            Err(e) => {
                tracing::warn!("Could not read stored user for feedback: {}", e);
                return Feedback::unavailable();
            }
        };

        let tests = self.tests().await;
        // Backend histories arrive newest first; rank oldest first.
        let mut history = user.test_history.clone();
        history.sort_by_key(|entry| entry.date);
        let samples: Vec<ScoreSample> = history.iter().map(ScoreSample::from).collect();
        feedback::generate(Some(&user.full_name), &samples, &catalog::titles(&tests))
    }

    /// Copies local results missing from the stored user's history into it.
    ///
    /// Entries are matched on `(testId, date)`. Returns how many were added.
    pub async fn sync_test_data(&self) -> Result<usize, ClientError> {
        let mut user = self.stored_user().await?.ok_or(ClientError::NotLoggedIn)?;
        let results = self.local_results().await;

        let mut known: HashSet<(i64, DateTime<Utc>)> = user
            .test_history
            .iter()
            .map(|h| (h.test_id, h.date))
            .collect();

        let mut added = 0;
        for result in &results {
            if known.insert((result.test_id, result.date)) {
                user.test_history.push(result.history_entry());
                added += 1;
            }
        }

        if added > 0 {
            store::save(self.store.as_ref(), USER_KEY, &user).await?;
            tracing::info!("Synchronised {} local results into history", added);
        }
        Ok(added)
    }
}
