use thiserror::Error;

use dcinv_api_client::ClientError;

use crate::confirm::ConfirmError;
use crate::editor::EditorError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Confirm(#[from] ConfirmError),
    #[error("equipment {0} is not in the current list")]
    UnknownEquipment(i64),
}

impl InventoryError {
    /// True when the user has to log in again.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_session_fatal())
    }
}
