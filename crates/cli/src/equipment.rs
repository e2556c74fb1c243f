use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use dcinv_api::{EquipmentDraft, SearchField};
use dcinv_inventory::editor::suggest_equipment_types;
use dialoguer::Confirm;

use crate::context::AppContext;
use crate::output::{filter_summary, print_datacenters, print_equipment, print_notice};

pub async fn run_datacenters() -> Result<()> {
    let ctx = AppContext::load()?;
    let datacenters = ctx.client.list_datacenters().await?;
    print_datacenters(&datacenters);
    Ok(())
}

pub async fn run_show(datacenter: i64, field: Option<SearchField>, value: Option<String>) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);

    match (field, value) {
        (field, Some(value)) => {
            if let Some(field) = field {
                controller.set_field(field).await?;
            }
            controller.set_value(&value);
            controller.commit_search().await?;
        }
        (Some(_), None) => bail!("--field needs --value"),
        (None, None) => {
            controller.refresh().await?;
        }
    }

    if let Some(summary) = filter_summary(&controller.snapshot().filters) {
        println!("{summary}");
    }
    match controller.status_line() {
        Some(status) => println!("{status}"),
        None => print_equipment(&controller.snapshot().records),
    }
    Ok(())
}

pub async fn run_suggest(datacenter: i64, field: SearchField, text: &str) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);
    controller.set_field(field).await?;

    for suggestion in controller.set_value(text) {
        println!("{suggestion}");
    }
    Ok(())
}

pub fn run_equipment_types(filter: Option<&str>) {
    for kind in suggest_equipment_types(filter.unwrap_or_default()) {
        println!("{kind}");
    }
}

/// Form values given on the command line. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct DraftArgs {
    pub equipment_type: Option<String>,
    pub service_tag: Option<String>,
    pub license_type: Option<String>,
    pub serial_number: Option<String>,
    pub expires: Option<NaiveDate>,
}

impl DraftArgs {
    fn fill(self, draft: &mut EquipmentDraft) {
        if let Some(v) = self.equipment_type {
            draft.equipment_type = v;
        }
        if let Some(v) = self.service_tag {
            draft.service_tag = v;
        }
        if let Some(v) = self.license_type {
            draft.license_type = v;
        }
        if let Some(v) = self.serial_number {
            draft.serial_number = v;
        }
        if let Some(date) = self.expires {
            draft.license_expired_date = Some(date);
        }
    }
}

pub async fn run_add(datacenter: i64, args: DraftArgs) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);
    controller.open_add();
    if let Some(draft) = controller.editor_mut().draft_mut() {
        args.fill(draft);
    }

    let result = controller.submit_editor().await;
    print_notice(&controller);
    result?;
    Ok(())
}

pub async fn run_modify(datacenter: i64, equipment_id: i64, args: DraftArgs) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);
    controller.refresh().await?;
    controller.open_edit(equipment_id)?;
    if let Some(draft) = controller.editor_mut().draft_mut() {
        args.fill(draft);
    }

    let result = controller.submit_editor().await;
    print_notice(&controller);
    result?;
    Ok(())
}

pub async fn run_delete(datacenter: i64, equipment_id: i64, assume_yes: bool) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);
    controller.refresh().await?;
    controller.request_delete(equipment_id)?;

    let label = controller
        .confirmer()
        .pending()
        .map(|t| t.label.clone())
        .unwrap_or_default();
    let confirmed = assume_yes
        || Confirm::new()
            .with_prompt(format!("Delete equipment {equipment_id} {label}?"))
            .default(false)
            .interact()
            .context("read confirmation")?;
    if !confirmed {
        controller.cancel_delete();
        println!("Cancelled.");
        return Ok(());
    }

    let result = controller.confirm_delete().await;
    print_notice(&controller);
    result?;
    Ok(())
}

pub async fn run_expiring(datacenter: i64) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut controller = ctx.controller(datacenter);
    let records = controller.check_expiring().await?;
    if records.is_empty() {
        println!("No licenses are expiring soon.");
        return Ok(());
    }
    print_notice(&controller);
    print_equipment(&records);
    Ok(())
}
