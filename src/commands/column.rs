//! Column Requests

use serde::{Deserialize, Serialize};

use super::{positions_for, PositionEntry};

/// Body of `PATCH /columns/reorder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderColumnsRequest {
    pub board_id: String,
    pub columns: Vec<PositionEntry>,
}

impl ReorderColumnsRequest {
    pub fn from_ordered_ids(board_id: impl Into<String>, column_ids: &[String]) -> Self {
        Self {
            board_id: board_id.into(),
            columns: positions_for(column_ids),
        }
    }
}
