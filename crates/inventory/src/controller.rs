use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use dcinv_api::{EquipmentQuery, EquipmentRecord, SearchField};
use dcinv_api_client::{ApiClient, ClientError, ImportFile};

use crate::confirm::{Confirmer, DeleteTarget};
use crate::editor::{EditorState, EditorSubmission};
use crate::error::InventoryError;
use crate::filter::FilterEngine;
use crate::import::{ImportOutcome, reconcile_import};
use crate::notice::{DEFAULT_NOTICE_DURATION, Notice, NoticeLevel};
use crate::snapshot::{GenerationGuard, InventorySnapshot};

pub const EMPTY_INVENTORY: &str = "No equipment data found. Add equipment to get started.";
pub const NO_MATCHES: &str = "No equipment matches the current filter.";
pub const FETCH_FAILURE: &str = "Failed to fetch equipment. Please try again.";
pub const SAVE_SUCCESS: &str = "Equipment saved successfully!";
pub const SAVE_FAILURE: &str = "Failed to save equipment. Please try again.";
pub const IMPORT_FAILURE: &str = "Failed to import Excel file.";
pub const EXPIRING_SOON: &str = "Some licenses are expiring soon. Please check the equipment list.";
pub const REPORT_SENT: &str = "PDF sent successfully!";
pub const REPORT_FAILURE: &str = "Failed to send PDF";

/// A fetch that has been issued a generation but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: EquipmentQuery,
}

#[derive(Debug)]
pub struct FetchResult {
    pub ticket: FetchTicket,
    pub result: Result<Vec<EquipmentRecord>, ClientError>,
}

/// Inventory view of one datacenter.
///
/// Owns the filter engine, confirmer, editor and snapshot, and runs their
/// requests through the shared [`ApiClient`]. Every list fetch goes through
/// [`begin_fetch`](Self::begin_fetch)/[`apply`](Self::apply) so a reply that
/// a newer fetch has superseded never overwrites the snapshot.
pub struct InventoryController {
    client: Arc<ApiClient>,
    datacenter_id: i64,
    filter: FilterEngine,
    confirmer: Confirmer,
    editor: EditorState,
    generations: GenerationGuard,
    snapshot: InventorySnapshot,
    notice: Option<Notice>,
    notice_ttl: Duration,
    last_import: Option<ImportOutcome>,
}

impl InventoryController {
    pub fn new(client: Arc<ApiClient>, datacenter_id: i64) -> Self {
        Self {
            client,
            datacenter_id,
            filter: FilterEngine::default(),
            confirmer: Confirmer::default(),
            editor: EditorState::default(),
            generations: GenerationGuard::default(),
            snapshot: InventorySnapshot::default(),
            notice: None,
            notice_ttl: DEFAULT_NOTICE_DURATION,
            last_import: None,
        }
    }

    pub fn with_notice_duration(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn datacenter_id(&self) -> i64 {
        self.datacenter_id
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn snapshot(&self) -> &InventorySnapshot {
        &self.snapshot
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn confirmer(&self) -> &Confirmer {
        &self.confirmer
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    pub fn last_import(&self) -> Option<&ImportOutcome> {
        self.last_import.as_ref()
    }

    // ── Notices ───────────────────────────────────────────────────────────

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice::new(level, text, Instant::now(), self.notice_ttl));
    }

    fn notify_failure(&mut self, err: &ClientError, fallback: &str) {
        self.notice = Some(Notice::for_failure(
            err,
            fallback,
            Instant::now(),
            self.notice_ttl,
        ));
    }

    /// The latest notice, while it is still fresh.
    pub fn visible_notice(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| !n.is_expired(now))
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Placeholder text for an empty list, once something has been loaded.
    pub fn status_line(&self) -> Option<&'static str> {
        if !self.snapshot.is_loaded() || !self.snapshot.is_empty() {
            return None;
        }
        Some(if self.snapshot.is_filtered() {
            NO_MATCHES
        } else {
            EMPTY_INVENTORY
        })
    }

    // ── Fetching ──────────────────────────────────────────────────────────

    pub fn begin_fetch(&mut self, query: EquipmentQuery) -> FetchTicket {
        FetchTicket {
            generation: self.generations.begin(),
            query,
        }
    }

    /// Run a ticket's request. The future does not borrow the controller,
    /// so several may be in flight at once.
    pub fn dispatch(
        &self,
        ticket: FetchTicket,
    ) -> impl Future<Output = FetchResult> + Send + 'static {
        let client = Arc::clone(&self.client);
        let datacenter_id = self.datacenter_id;
        async move {
            let result = client.list_equipment(datacenter_id, &ticket.query).await;
            FetchResult { ticket, result }
        }
    }

    /// Apply a finished fetch. Returns `Ok(false)` when the reply was stale
    /// and dropped.
    pub fn apply(&mut self, fetched: FetchResult) -> Result<bool, ClientError> {
        let FetchResult { ticket, result } = fetched;
        if !self.generations.accept(ticket.generation) {
            debug!(
                "discarding stale equipment fetch (generation {} < {})",
                ticket.generation,
                self.generations.newest()
            );
            return Ok(false);
        }

        match result {
            Ok(records) => {
                debug!(
                    "equipment fetch generation {} returned {} records",
                    ticket.generation,
                    records.len()
                );
                self.filter.observe(&ticket.query, &records);
                self.snapshot = InventorySnapshot {
                    records,
                    filters: ticket.query,
                    generation: ticket.generation,
                };
                Ok(true)
            }
            Err(err) => {
                warn!("equipment fetch failed: {err}");
                self.notify_failure(&err, FETCH_FAILURE);
                Err(err)
            }
        }
    }

    pub async fn fetch(&mut self, query: EquipmentQuery) -> Result<bool, ClientError> {
        let ticket = self.begin_fetch(query);
        let fetched = self.dispatch(ticket).await;
        self.apply(fetched)
    }

    /// Re-fetch with the filters currently in force.
    pub async fn refresh(&mut self) -> Result<bool, ClientError> {
        let query = self.filter.active_query();
        self.fetch(query).await
    }

    // ── Filtering ─────────────────────────────────────────────────────────

    pub async fn set_field(&mut self, field: SearchField) -> Result<bool, ClientError> {
        let query = self.filter.set_field(field);
        self.fetch(query).await
    }

    /// Update the search box; returns the suggestions for it.
    pub fn set_value(&mut self, text: &str) -> Vec<String> {
        self.filter.set_value(text).to_vec()
    }

    pub async fn commit_search(&mut self) -> Result<bool, ClientError> {
        let query = self.filter.commit();
        self.fetch(query).await
    }

    pub async fn select_suggestion(&mut self, suggestion: &str) -> Result<bool, ClientError> {
        let query = self.filter.select_suggestion(suggestion);
        self.fetch(query).await
    }

    pub async fn clear_filter(&mut self, field: SearchField) -> Result<bool, ClientError> {
        let query = self.filter.clear_filter(field);
        self.fetch(query).await
    }

    pub async fn clear_filters(&mut self) -> Result<bool, ClientError> {
        let query = self.filter.clear_all();
        self.fetch(query).await
    }

    // ── Delete ────────────────────────────────────────────────────────────

    pub fn request_delete(&mut self, equipment_id: i64) -> Result<(), InventoryError> {
        let target = self
            .snapshot
            .find(equipment_id)
            .map(DeleteTarget::from)
            .ok_or(InventoryError::UnknownEquipment(equipment_id))?;
        self.confirmer.request(target)?;
        Ok(())
    }

    pub fn cancel_delete(&mut self) -> Option<DeleteTarget> {
        self.confirmer.cancel()
    }

    /// Send the pending delete. On success the list is re-fetched; on
    /// failure the snapshot is left as it was.
    pub async fn confirm_delete(&mut self) -> Result<(), InventoryError> {
        let target = self.confirmer.confirm()?;
        let result = self
            .client
            .delete_equipment(self.datacenter_id, target.id)
            .await;
        let notice = self
            .confirmer
            .finish(&result, Instant::now(), self.notice_ttl);
        self.notice = Some(notice);

        if let Err(err) = result {
            warn!("delete of equipment {} failed: {err}", target.id);
            return Err(err.into());
        }
        info!("deleted equipment {} ({})", target.id, target.label);
        self.refresh().await?;
        Ok(())
    }

    // ── Import ────────────────────────────────────────────────────────────

    /// Upload a spreadsheet and re-fetch the list, whatever its error count.
    pub async fn import(&mut self, file: &ImportFile) -> Result<ImportOutcome, InventoryError> {
        let outcome = match reconcile_import(&self.client, self.datacenter_id, file).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("import of {} failed: {err}", file.file_name);
                self.notify_failure(&err, IMPORT_FAILURE);
                return Err(err.into());
            }
        };

        let level = if outcome.has_errors() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Success
        };
        self.notify(level, outcome.summary());
        self.last_import = Some(outcome.clone());

        if let Err(err) = self.refresh().await {
            if err.is_session_fatal() {
                return Err(err.into());
            }
            warn!("refetch after import failed: {err}");
        }
        Ok(outcome)
    }

    // ── Editor ────────────────────────────────────────────────────────────

    pub fn open_add(&mut self) {
        self.editor.open_add();
    }

    pub fn open_edit(&mut self, equipment_id: i64) -> Result<(), InventoryError> {
        let record = self
            .snapshot
            .find(equipment_id)
            .ok_or(InventoryError::UnknownEquipment(equipment_id))?;
        self.editor.open_edit(record);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editor.close();
    }

    /// Validate and send the open form. The editor stays open on failure.
    pub async fn submit_editor(&mut self) -> Result<(), InventoryError> {
        let submission = match self.editor.submission() {
            Ok(submission) => submission,
            Err(err) => {
                self.notify(NoticeLevel::Error, err.to_string());
                return Err(err.into());
            }
        };

        let result = match &submission {
            EditorSubmission::Add(draft) => {
                self.client.add_equipment(self.datacenter_id, draft).await
            }
            EditorSubmission::Modify { id, draft } => {
                self.client
                    .modify_equipment(self.datacenter_id, *id, draft)
                    .await
            }
        };
        if let Err(err) = result {
            warn!("saving equipment failed: {err}");
            self.notify_failure(&err, SAVE_FAILURE);
            return Err(err.into());
        }

        self.editor.close();
        self.notify(NoticeLevel::Success, SAVE_SUCCESS);
        self.refresh().await?;
        Ok(())
    }

    // ── Reports ───────────────────────────────────────────────────────────

    pub async fn send_report(&mut self, email: &str) -> Result<(), InventoryError> {
        match self.client.send_pdf(self.datacenter_id, email).await {
            Ok(resp) => {
                let text = resp.message.unwrap_or_else(|| REPORT_SENT.to_string());
                self.notify(NoticeLevel::Success, text);
                Ok(())
            }
            Err(err) => {
                self.notify_failure(&err, REPORT_FAILURE);
                Err(err.into())
            }
        }
    }

    /// Fetch equipment whose license is about to lapse and warn when any is.
    pub async fn check_expiring(&mut self) -> Result<Vec<EquipmentRecord>, InventoryError> {
        let expiring = self.client.expiring_equipment(self.datacenter_id).await?;
        if !expiring.is_empty() {
            info!("{} licenses expiring soon", expiring.len());
            self.notify(NoticeLevel::Warning, EXPIRING_SOON);
        }
        Ok(expiring)
    }
}
