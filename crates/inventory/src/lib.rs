pub mod confirm;
pub mod controller;
pub mod editor;
pub mod error;
pub mod filter;
pub mod import;
pub mod notice;
pub mod snapshot;

pub use confirm::{ConfirmError, ConfirmState, Confirmer, DeleteTarget};
pub use controller::{FetchResult, FetchTicket, InventoryController};
pub use editor::{EQUIPMENT_TYPES, EditorError, EditorState, EditorSubmission};
pub use error::InventoryError;
pub use filter::{FilterEngine, KnownValues};
pub use import::{ERROR_DISPLAY_LIMIT, ErrorDigest, ImportOutcome, reconcile_import};
pub use notice::{Notice, NoticeLevel};
pub use snapshot::{GenerationGuard, InventorySnapshot};
