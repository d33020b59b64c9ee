//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// One online user in the connection snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummaryDto {
    pub user_id: String,
    pub connections: usize,
}
