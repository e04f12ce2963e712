// src/models/mod.rs

pub mod attempt;
pub mod test;
pub mod user;

use serde::Serialize;
use utoipa::ToSchema;

/// `{ "success": true }` acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
