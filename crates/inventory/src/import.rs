use std::fmt;

use tracing::{info, warn};

use dcinv_api::ImportReport;
use dcinv_api_client::normalize::flatten_errors;
use dcinv_api_client::{ApiClient, ClientError, ImportFile};

/// Number of import errors shown before collapsing the rest into a count.
pub const ERROR_DISPLAY_LIMIT: usize = 5;

/// Normalized result of one spreadsheet import.
///
/// Partial failure is data, not an error: rows that failed are listed in
/// `errors` while the rest were applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported_count: u64,
    pub updated_count: u64,
    pub error_count: u64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub message: Option<String>,
}

impl ImportOutcome {
    pub fn from_report(report: ImportReport) -> Self {
        let errors = flatten_errors(&report.errors);
        let error_count = report.error_count.unwrap_or(errors.len() as u64);
        // Servers that only report rows processed imply the imported count.
        let imported_count = report.imported_count.unwrap_or_else(|| {
            report
                .total_rows_processed
                .map_or(0, |total| total.saturating_sub(error_count))
        });
        Self {
            imported_count,
            updated_count: report.updated_count.unwrap_or(0),
            error_count,
            errors,
            warnings: report.warnings,
            message: report.message,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0 || !self.errors.is_empty()
    }

    /// One-line summary shown after the upload completes.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Successfully imported {} equipment items.",
            self.imported_count
        );
        if self.error_count > 0 {
            text.push_str(&format!(" {} items had errors.", self.error_count));
        }
        text
    }

    pub fn digest(&self) -> ErrorDigest<'_> {
        ErrorDigest::new(&self.errors, self.error_count)
    }
}

/// The first [`ERROR_DISPLAY_LIMIT`] errors plus a count of the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDigest<'a> {
    pub shown: &'a [String],
    pub remaining: u64,
}

impl<'a> ErrorDigest<'a> {
    pub fn new(errors: &'a [String], error_count: u64) -> Self {
        let shown = &errors[..errors.len().min(ERROR_DISPLAY_LIMIT)];
        let total = error_count.max(errors.len() as u64);
        Self {
            shown,
            remaining: total.saturating_sub(shown.len() as u64),
        }
    }

    /// Lines to display, the remainder indicator included.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.shown.to_vec();
        if self.remaining > 0 {
            lines.push(format!("... and {} more", self.remaining));
        }
        lines
    }
}

impl fmt::Display for ErrorDigest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Validate, upload and normalize one spreadsheet.
///
/// Refetching the inventory afterwards is the caller's job.
pub async fn reconcile_import(
    client: &ApiClient,
    datacenter_id: i64,
    file: &ImportFile,
) -> Result<ImportOutcome, ClientError> {
    file.ensure_spreadsheet()?;

    let report = client.import_excel(datacenter_id, file).await?;
    let outcome = ImportOutcome::from_report(report);
    info!(
        "import of {} finished: {} imported, {} updated, {} errors",
        file.file_name, outcome.imported_count, outcome.updated_count, outcome.error_count
    );
    for warning in &outcome.warnings {
        warn!("import warning: {warning}");
    }
    Ok(outcome)
}
