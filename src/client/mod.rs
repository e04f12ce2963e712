//! Client-side service layer for the quiz backend.

pub mod api;
pub mod error;
pub mod mode;
pub mod service;
pub mod store;
pub mod types;

pub use api::ApiClient;
pub use error::ClientError;
pub use mode::{ApiMode, ClientSettings, ServiceMode};
pub use service::{Dashboard, QuizClient, sample_questions};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{HistoryEntry, RegisterForm, StoredUser, TestResult, UNANSWERED};
