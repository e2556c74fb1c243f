use anyhow::{Context, Result};
use clap::ValueEnum;
use dcinv_api::{EquipmentQuery, SearchField};
use dcinv_api_client::ImportFile;
use std::path::{Path, PathBuf};

use crate::context::AppContext;
use crate::output::print_notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Excel,
    Pdf,
}

/// Default file name for an export, matching the server's download names.
pub fn default_export_name(format: ExportFormat, datacenter: i64, today: chrono::NaiveDate) -> String {
    match format {
        ExportFormat::Excel => format!("equipments_{datacenter}_{}.xlsx", today.format("%Y-%m-%d")),
        ExportFormat::Pdf => format!("equipment_report_{datacenter}.pdf"),
    }
}

pub async fn run_import(datacenter: i64, path: &Path) -> Result<()> {
    let ctx = AppContext::load()?;
    let file =
        ImportFile::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut controller = ctx.controller(datacenter);

    let outcome = match controller.import(&file).await {
        Ok(outcome) => outcome,
        Err(e) => {
            print_notice(&controller);
            return Err(e.into());
        }
    };

    println!("{}", outcome.summary());
    if let Some(message) = &outcome.message {
        println!("Server: {message}");
    }
    let digest = outcome.digest();
    if !digest.shown.is_empty() {
        println!("Errors:");
        for line in digest.lines() {
            println!("  {line}");
        }
    }
    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }
    println!("{} equipment items now listed.", controller.snapshot().len());
    Ok(())
}

pub async fn run_export(
    datacenter: i64,
    format: ExportFormat,
    output: Option<PathBuf>,
    field: Option<SearchField>,
    value: Option<String>,
) -> Result<()> {
    let ctx = AppContext::load()?;
    let bytes = match format {
        ExportFormat::Excel => {
            let query = match (field, value) {
                (Some(field), Some(value)) => EquipmentQuery::single(field, value),
                (None, Some(value)) => EquipmentQuery::single(SearchField::ServiceTag, value),
                _ => EquipmentQuery::default(),
            };
            ctx.client
                .export_excel(datacenter, &query)
                .await
                .context("Error exporting Excel")?
        }
        ExportFormat::Pdf => ctx
            .client
            .export_pdf(datacenter)
            .await
            .context("Failed to export PDF")?,
    };

    let path = output.unwrap_or_else(|| {
        PathBuf::from(default_export_name(
            format,
            datacenter,
            chrono::Local::now().date_naive(),
        ))
    });
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {} ({} bytes).", path.display(), bytes.len());
    Ok(())
}

pub async fn run_send_report(datacenter: i64, email: &str) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);
    let result = controller.send_report(email).await;
    print_notice(&controller);
    result?;
    Ok(())
}
