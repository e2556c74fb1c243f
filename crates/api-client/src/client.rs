use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use dcinv_api::*;

use crate::error::ClientError;
use crate::gateway::{Gateway, Replay, parse_json, read_bytes};
use crate::retry::RetryPolicy;
use crate::session::{Session, SessionStore};

/// Extensions accepted by the spreadsheet import endpoint.
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Connection settings resolved from the runtime config.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL including the `/api` prefix, e.g. `http://127.0.0.1:8000/api`.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Longer timeout used only for spreadsheet uploads.
    pub import_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout: Duration::from_secs(10),
            import_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

/// A spreadsheet selected for import.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its final path component as name.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Reject anything that is not `.xlsx`/`.xls` before touching the network.
    pub fn ensure_spreadsheet(&self) -> Result<(), ClientError> {
        let lower = self.file_name.to_ascii_lowercase();
        if SPREADSHEET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Ok(())
        } else {
            Err(ClientError::InvalidFileType(self.file_name.clone()))
        }
    }
}

/// Typed HTTP client for the inventory API.
///
/// Every authenticated endpoint goes through the [`Gateway`], so token
/// refresh applies uniformly. Timeouts are retried for reads and deletes;
/// calls that create or change data are sent once.
pub struct ApiClient {
    gateway: Gateway,
    import_timeout: Duration,
}

impl ApiClient {
    /// Create a new client with its own connection pool.
    pub fn new(options: ClientOptions, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self::with_client(http, options, store))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(
        http: reqwest::Client,
        options: ClientOptions,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            gateway: Gateway::new(http, &options.base_url, Session::new(store), options.retry),
            import_timeout: options.import_timeout,
        }
    }

    pub fn session(&self) -> &Session {
        self.gateway.session()
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }

    fn equipment_url(&self, datacenter_id: i64, suffix: &str) -> String {
        self.gateway
            .url(&format!("/datacenters/{datacenter_id}/equipments/{suffix}"))
    }

    // ── Auth ──────────────────────────────────────────────────────────────

    /// Exchange credentials for a token pair and start the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(ClientError::validation("Username and password are required"));
        }

        let url = self.gateway.url("/token/");
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let resp = self
            .gateway
            .send_anonymous("login", |http| http.post(&url).json(&body))
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::validation("Invalid username or password"));
        }

        let pair: TokenPair = parse_json(resp).await?;
        self.session().begin(pair);
        info!("logged in as {}", body.username);
        Ok(())
    }

    /// Invalidate the refresh token server-side and clear the session.
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.session().refresh_token() {
            let url = self.gateway.url("/logout/");
            let body = LogoutRequest { refresh_token };
            let result = self
                .gateway
                .execute("logout", Replay::Never, |http| http.post(&url).json(&body))
                .await;
            if let Err(e) = result {
                warn!("logout request failed: {e}");
            }
        }
        self.session().clear();
        debug!("session cleared");
    }

    // ── Datacenters ───────────────────────────────────────────────────────

    pub async fn list_datacenters(&self) -> Result<Vec<Datacenter>, ClientError> {
        let url = self.gateway.url("/datacenters/");
        self.gateway
            .execute_json("list datacenters", Replay::OnTimeout, |http| http.get(&url))
            .await
    }

    pub async fn get_datacenter(&self, id: i64) -> Result<Datacenter, ClientError> {
        let url = self.gateway.url(&format!("/datacenters/{id}/"));
        self.gateway
            .execute_json("get datacenter", Replay::OnTimeout, |http| http.get(&url))
            .await
    }

    // ── Equipment ─────────────────────────────────────────────────────────

    pub async fn list_equipment(
        &self,
        datacenter_id: i64,
        query: &EquipmentQuery,
    ) -> Result<Vec<EquipmentRecord>, ClientError> {
        let url = self.equipment_url(datacenter_id, "");
        let params = query.pairs();
        self.gateway
            .execute_json("list equipment", Replay::OnTimeout, |http| http.get(&url).query(&params))
            .await
    }

    pub async fn add_equipment(
        &self,
        datacenter_id: i64,
        draft: &EquipmentDraft,
    ) -> Result<(), ClientError> {
        let url = self.equipment_url(datacenter_id, "add/");
        self.gateway
            .execute("add equipment", Replay::Never, |http| http.post(&url).json(draft))
            .await?;
        Ok(())
    }

    pub async fn modify_equipment(
        &self,
        datacenter_id: i64,
        equipment_id: i64,
        draft: &EquipmentDraft,
    ) -> Result<(), ClientError> {
        let url = self.equipment_url(datacenter_id, &format!("{equipment_id}/modify/"));
        self.gateway
            .execute("modify equipment", Replay::Never, |http| http.patch(&url).json(draft))
            .await?;
        Ok(())
    }

    pub async fn delete_equipment(
        &self,
        datacenter_id: i64,
        equipment_id: i64,
    ) -> Result<(), ClientError> {
        let url = self.equipment_url(datacenter_id, &format!("{equipment_id}/delete/"));
        self.gateway
            .execute("delete equipment", Replay::OnTimeout, |http| http.delete(&url))
            .await?;
        Ok(())
    }

    pub async fn license_types(&self, datacenter_id: i64) -> Result<Vec<String>, ClientError> {
        let url = self.equipment_url(datacenter_id, "license-types/");
        self.gateway
            .execute_json("license types", Replay::OnTimeout, |http| http.get(&url))
            .await
    }

    pub async fn service_tags(&self, datacenter_id: i64) -> Result<Vec<String>, ClientError> {
        let url = self.equipment_url(datacenter_id, "service-tags/");
        self.gateway
            .execute_json("service tags", Replay::OnTimeout, |http| http.get(&url))
            .await
    }

    pub async fn expiring_equipment(
        &self,
        datacenter_id: i64,
    ) -> Result<Vec<EquipmentRecord>, ClientError> {
        let url = self.equipment_url(datacenter_id, "expiring/");
        self.gateway
            .execute_json("expiring equipment", Replay::OnTimeout, |http| http.get(&url))
            .await
    }

    // ── Bulk operations ───────────────────────────────────────────────────

    pub async fn export_excel(
        &self,
        datacenter_id: i64,
        query: &EquipmentQuery,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.equipment_url(datacenter_id, "export-excel/");
        let params = query.pairs();
        let resp = self
            .gateway
            .execute_raw("export excel", Replay::OnTimeout, |http| http.get(&url).query(&params))
            .await?;
        read_bytes(resp).await
    }

    pub async fn export_pdf(&self, datacenter_id: i64) -> Result<Vec<u8>, ClientError> {
        let url = self.equipment_url(datacenter_id, "export-pdf/");
        let resp = self
            .gateway
            .execute_raw("export pdf", Replay::OnTimeout, |http| http.get(&url))
            .await?;
        read_bytes(resp).await
    }

    /// Upload a spreadsheet for server-side parsing.
    ///
    /// A 400 whose body is still an import report (every row rejected) is
    /// returned as data, not as an error.
    pub async fn import_excel(
        &self,
        datacenter_id: i64,
        file: &ImportFile,
    ) -> Result<ImportReport, ClientError> {
        file.ensure_spreadsheet()?;

        let url = self.equipment_url(datacenter_id, "import-excel/");
        let timeout = self.import_timeout;
        debug!(
            "uploading {} ({} bytes) to {}",
            file.file_name,
            file.bytes.len(),
            url
        );
        let resp = self
            .gateway
            .execute_raw("import equipment", Replay::Never, |http| {
                let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                http.post(&url)
                    .multipart(Form::new().part("file", part))
                    .timeout(timeout)
            })
            .await?;

        let status = resp.status();
        if status.is_success() {
            return parse_json(resp).await;
        }

        let body = resp.bytes().await.map_err(ClientError::from_reqwest)?;
        if status == StatusCode::BAD_REQUEST {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) {
                if ImportReport::looks_like_report(&value) {
                    return serde_json::from_value(value)
                        .map_err(|e| ClientError::Decode(e.to_string()));
                }
            }
        }
        Err(ClientError::from_status(status, &body))
    }

    /// Ask the server to email the PDF report.
    pub async fn send_pdf(
        &self,
        datacenter_id: i64,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ClientError::validation("Please enter an email address"));
        }
        let url = self.equipment_url(datacenter_id, "send-pdf/");
        let body = SendPdfRequest {
            email: email.to_string(),
        };
        self.gateway
            .execute_json("send pdf", Replay::Never, |http| http.post(&url).json(&body))
            .await
    }
}
