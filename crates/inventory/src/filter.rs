//! Search/filter state over the equipment list.
//!
//! The engine never performs I/O. Every transition that needs a new fetch
//! returns the [`EquipmentQuery`] to send; the caller runs it and feeds the
//! unfiltered results back through [`FilterEngine::observe`].

use std::collections::{BTreeMap, BTreeSet};

use dcinv_api::{EquipmentQuery, EquipmentRecord, SearchField};

/// Distinct values per searchable field, taken from the last unfiltered load.
#[derive(Debug, Clone, Default)]
pub struct KnownValues {
    by_field: BTreeMap<SearchField, BTreeSet<String>>,
}

impl KnownValues {
    pub fn from_records(records: &[EquipmentRecord]) -> Self {
        let mut by_field: BTreeMap<SearchField, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            for field in SearchField::ALL {
                let value = field.value_of(record).trim();
                if !value.is_empty() {
                    by_field
                        .entry(field)
                        .or_default()
                        .insert(value.to_string());
                }
            }
        }
        Self { by_field }
    }

    pub fn values(&self, field: SearchField) -> impl Iterator<Item = &str> {
        self.by_field
            .get(&field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Known values of `field` containing `text`, ignoring case.
    pub fn suggest(&self, field: SearchField, text: &str) -> Vec<String> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.values(field)
            .filter(|v| v.to_lowercase().contains(&needle))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FilterEngine {
    field: SearchField,
    value: String,
    active: BTreeMap<SearchField, String>,
    known: KnownValues,
    suggestions: Vec<String>,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(SearchField::ServiceTag)
    }
}

impl FilterEngine {
    pub fn new(field: SearchField) -> Self {
        Self {
            field,
            value: String::new(),
            active: BTreeMap::new(),
            known: KnownValues::default(),
            suggestions: Vec::new(),
        }
    }

    pub fn field(&self) -> SearchField {
        self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn known_values(&self) -> &KnownValues {
        &self.known
    }

    pub fn active_filters(&self) -> &BTreeMap<SearchField, String> {
        &self.active
    }

    /// Query for the filters currently in force.
    pub fn active_query(&self) -> EquipmentQuery {
        let mut query = EquipmentQuery::default();
        for (field, value) in &self.active {
            query.set(*field, Some(value.clone()));
        }
        query
    }

    /// Switch the search field.
    ///
    /// The value typed for the old field and any filter held on it are
    /// dropped before the returned query is built; filters on other fields
    /// survive.
    pub fn set_field(&mut self, field: SearchField) -> EquipmentQuery {
        let previous = self.field;
        self.active.remove(&previous);
        self.value.clear();
        self.suggestions.clear();
        self.field = field;
        self.active_query()
    }

    /// Update the typed value and return the matching suggestions.
    pub fn set_value(&mut self, text: &str) -> &[String] {
        self.value = text.to_string();
        self.suggestions = self.known.suggest(self.field, text);
        &self.suggestions
    }

    /// Apply the typed value as the only active filter.
    ///
    /// A blank value clears every filter.
    pub fn commit(&mut self) -> EquipmentQuery {
        let value = self.value.trim().to_string();
        self.active.clear();
        self.suggestions.clear();
        if !value.is_empty() {
            self.active.insert(self.field, value.clone());
        }
        self.value = value;
        self.active_query()
    }

    pub fn select_suggestion(&mut self, suggestion: &str) -> EquipmentQuery {
        self.value = suggestion.to_string();
        self.commit()
    }

    /// Drop one field's filter, keeping the rest.
    pub fn clear_filter(&mut self, field: SearchField) -> EquipmentQuery {
        self.active.remove(&field);
        if field == self.field {
            self.value.clear();
            self.suggestions.clear();
        }
        self.active_query()
    }

    pub fn clear_all(&mut self) -> EquipmentQuery {
        self.active.clear();
        self.value.clear();
        self.suggestions.clear();
        EquipmentQuery::default()
    }

    /// Feed back a fetched record set. Only unfiltered sets refresh the
    /// suggestion index, so suggestions never shrink to the current filter.
    pub fn observe(&mut self, query: &EquipmentQuery, records: &[EquipmentRecord]) {
        if query.is_empty() {
            self.known = KnownValues::from_records(records);
        }
    }
}
