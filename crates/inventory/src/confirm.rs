use std::time::{Duration, Instant};

use thiserror::Error;

use dcinv_api::EquipmentRecord;
use dcinv_api_client::ClientError;

use crate::notice::Notice;

pub const DELETE_SUCCESS: &str = "Equipment deleted successfully!";
pub const DELETE_FAILURE: &str = "Failed to delete equipment. Please try again.";

/// Record a delete is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: i64,
    pub label: String,
}

impl From<&EquipmentRecord> for DeleteTarget {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            id: record.id,
            label: format!("{} ({})", record.service_tag, record.equipment_type),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfirmState {
    #[default]
    Idle,
    PendingConfirm(DeleteTarget),
    InFlight(DeleteTarget),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmError {
    #[error("a delete is already in progress")]
    Busy,
    #[error("no delete is waiting for confirmation")]
    NothingPending,
}

/// Two-step guard in front of deletes.
///
/// `Idle -> PendingConfirm -> (cancel -> Idle | confirm -> InFlight -> Idle)`.
#[derive(Debug, Default)]
pub struct Confirmer {
    state: ConfirmState,
}

impl Confirmer {
    pub fn state(&self) -> &ConfirmState {
        &self.state
    }

    pub fn pending(&self) -> Option<&DeleteTarget> {
        match &self.state {
            ConfirmState::PendingConfirm(target) => Some(target),
            _ => None,
        }
    }

    /// Ask for confirmation. A pending target is replaced.
    pub fn request(&mut self, target: DeleteTarget) -> Result<(), ConfirmError> {
        if matches!(self.state, ConfirmState::InFlight(_)) {
            return Err(ConfirmError::Busy);
        }
        self.state = ConfirmState::PendingConfirm(target);
        Ok(())
    }

    /// Back out of a pending delete. Has no effect once the delete is sent.
    pub fn cancel(&mut self) -> Option<DeleteTarget> {
        match std::mem::take(&mut self.state) {
            ConfirmState::PendingConfirm(target) => Some(target),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Move the pending target in flight and hand it to the caller to delete.
    pub fn confirm(&mut self) -> Result<DeleteTarget, ConfirmError> {
        match std::mem::take(&mut self.state) {
            ConfirmState::PendingConfirm(target) => {
                self.state = ConfirmState::InFlight(target.clone());
                Ok(target)
            }
            other => {
                let busy = matches!(other, ConfirmState::InFlight(_));
                self.state = other;
                Err(if busy {
                    ConfirmError::Busy
                } else {
                    ConfirmError::NothingPending
                })
            }
        }
    }

    /// Record the delete result, return to `Idle` and build the notice.
    pub fn finish(
        &mut self,
        result: &Result<(), ClientError>,
        now: Instant,
        ttl: Duration,
    ) -> Notice {
        self.state = ConfirmState::Idle;
        match result {
            Ok(()) => Notice::success(DELETE_SUCCESS, now, ttl),
            Err(err) => Notice::for_failure(err, DELETE_FAILURE, now, ttl),
        }
    }
}
