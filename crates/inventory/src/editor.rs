use thiserror::Error;

use dcinv_api::{EquipmentDraft, EquipmentRecord};

/// Equipment types offered as suggestions in the add/edit form.
pub const EQUIPMENT_TYPES: [&str; 20] = [
    "Server",
    "Firewall",
    "Storage Array",
    "Switch",
    "Router",
    "Load Balancer",
    "NAS",
    "SAN",
    "Backup Appliance",
    "UPS",
    "PDU",
    "KVM Switch",
    "Network Attached Storage",
    "Tape Library",
    "Network Appliance",
    "Security Appliance",
    "Wireless Controller",
    "VoIP Gateway",
    "Media Gateway",
    "Optical Transport",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("Please fill in all required fields")]
    MissingFields(Vec<&'static str>),
    #[error("the equipment editor is not open")]
    NotOpen,
}

/// The add/edit dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Closed,
    Adding(EquipmentDraft),
    Editing { id: i64, draft: EquipmentDraft },
}

/// A validated form, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorSubmission {
    Add(EquipmentDraft),
    Modify { id: i64, draft: EquipmentDraft },
}

impl EditorState {
    pub fn open_add(&mut self) {
        *self = Self::Adding(EquipmentDraft::default());
    }

    pub fn open_edit(&mut self, record: &EquipmentRecord) {
        *self = Self::Editing {
            id: record.id,
            draft: EquipmentDraft::from(record),
        };
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn draft(&self) -> Option<&EquipmentDraft> {
        match self {
            Self::Closed => None,
            Self::Adding(draft) | Self::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EquipmentDraft> {
        match self {
            Self::Closed => None,
            Self::Adding(draft) | Self::Editing { draft, .. } => Some(draft),
        }
    }

    /// Validate the open form. Nothing is sent when a required field is blank.
    pub fn submission(&self) -> Result<EditorSubmission, EditorError> {
        let draft = self.draft().ok_or(EditorError::NotOpen)?;
        let missing = missing_fields(draft);
        if !missing.is_empty() {
            return Err(EditorError::MissingFields(missing));
        }
        let draft = trimmed(draft);
        Ok(match self {
            Self::Editing { id, .. } => EditorSubmission::Modify { id: *id, draft },
            _ => EditorSubmission::Add(draft),
        })
    }
}

/// Names of required fields that are blank.
pub fn missing_fields(draft: &EquipmentDraft) -> Vec<&'static str> {
    [
        ("equipment_type", &draft.equipment_type),
        ("service_tag", &draft.service_tag),
        ("license_type", &draft.license_type),
        ("serial_number", &draft.serial_number),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
}

fn trimmed(draft: &EquipmentDraft) -> EquipmentDraft {
    EquipmentDraft {
        equipment_type: draft.equipment_type.trim().to_string(),
        service_tag: draft.service_tag.trim().to_string(),
        license_type: draft.license_type.trim().to_string(),
        serial_number: draft.serial_number.trim().to_string(),
        license_expired_date: draft.license_expired_date,
    }
}

/// Catalogue entries containing `text`, ignoring case.
pub fn suggest_equipment_types(text: &str) -> Vec<&'static str> {
    let needle = text.trim().to_lowercase();
    EQUIPMENT_TYPES
        .iter()
        .copied()
        .filter(|t| needle.is_empty() || t.to_lowercase().contains(&needle))
        .collect()
}
