use std::time::Instant;

use dcinv_api::{Datacenter, EquipmentQuery, EquipmentRecord, SearchField};
use dcinv_inventory::{InventoryController, NoticeLevel};

pub fn print_datacenters(datacenters: &[Datacenter]) {
    if datacenters.is_empty() {
        println!("No datacenters found.");
        return;
    }
    println!("{:<6} {:<24} DESCRIPTION", "ID", "NAME");
    for dc in datacenters {
        println!("{:<6} {:<24} {}", dc.id, dc.name, dc.description);
    }
}

/// One-line description of the filters behind a listing, if any.
pub fn filter_summary(filters: &EquipmentQuery) -> Option<String> {
    let parts: Vec<String> = SearchField::ALL
        .iter()
        .filter_map(|f| filters.get(*f).map(|v| format!("{} = {v}", f.label())))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("Filtered by {}", parts.join(", ")))
    }
}

fn expiry_cell(record: &EquipmentRecord) -> String {
    match record.license_expiry_date {
        Some(date) if record.is_expired => format!("{date} (expired)"),
        Some(date) => date.to_string(),
        None => "-".to_string(),
    }
}

pub fn print_equipment(records: &[EquipmentRecord]) {
    let type_width = column_width(records, "TYPE", |r| &r.equipment_type);
    let tag_width = column_width(records, "SERVICE TAG", |r| &r.service_tag);
    let license_width = column_width(records, "LICENSE", |r| &r.license_type);
    let serial_width = column_width(records, "SERIAL", |r| &r.serial_number);

    println!(
        "{:<6} {:<type_width$} {:<tag_width$} {:<license_width$} {:<serial_width$} EXPIRES",
        "ID", "TYPE", "SERVICE TAG", "LICENSE", "SERIAL"
    );
    for r in records {
        println!(
            "{:<6} {:<type_width$} {:<tag_width$} {:<license_width$} {:<serial_width$} {}",
            r.id,
            r.equipment_type,
            r.service_tag,
            r.license_type,
            r.serial_number,
            expiry_cell(r)
        );
    }
}

fn column_width(
    records: &[EquipmentRecord],
    header: &str,
    value: impl Fn(&EquipmentRecord) -> &String,
) -> usize {
    records
        .iter()
        .map(|r| value(r).chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(header.len())
}

/// Print the controller's current notice, errors to stderr.
pub fn print_notice(controller: &InventoryController) {
    let Some(notice) = controller.visible_notice(Instant::now()) else {
        return;
    };
    match notice.level {
        NoticeLevel::Error => eprintln!("{}", notice.text),
        NoticeLevel::Warning => eprintln!("Warning: {}", notice.text),
        NoticeLevel::Success | NoticeLevel::Info => println!("{}", notice.text),
    }
}
