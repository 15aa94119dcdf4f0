use serde::{Deserialize, Serialize};

use crate::models::{MetricField, MetricValues, SetKey};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputEntry {
    pub key: SetKey,
    pub values: MetricValues,
    /// Fields the user typed in themselves, as opposed to seeded values.
    #[serde(default)]
    pub manual: Vec<MetricField>,
}

impl InputEntry {
    pub fn is_manual(&self, field: MetricField) -> bool {
        self.manual.contains(&field)
    }
}

/// Transient performance inputs for sets that are not logged yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InputBuffer {
    entries: Vec<InputEntry>,
}

impl InputBuffer {
    pub fn get(&self, key: &SetKey) -> Option<&InputEntry> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub fn values(&self, key: &SetKey) -> MetricValues {
        self.get(key)
            .map(|entry| entry.values.clone())
            .unwrap_or_default()
    }

    pub fn is_manual(&self, key: &SetKey, field: MetricField) -> bool {
        self.get(key)
            .map(|entry| entry.is_manual(field))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, key: &SetKey) -> &mut InputEntry {
        if let Some(pos) = self.entries.iter().position(|entry| &entry.key == key) {
            return &mut self.entries[pos];
        }
        self.entries.push(InputEntry {
            key: key.clone(),
            values: MetricValues::default(),
            manual: Vec::new(),
        });
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Seeds suggested values without marking them as user edits.
    pub fn seed(&mut self, key: &SetKey, values: MetricValues) {
        self.entry_mut(key).values = values;
    }

    /// Records a value the user entered.
    pub fn set_manual(&mut self, key: &SetKey, field: MetricField, value: Option<f64>) {
        let entry = self.entry_mut(key);
        entry.values.set(field, value);
        if !entry.manual.contains(&field) {
            entry.manual.push(field);
        }
    }

    /// Puts logged values back after a set is un-completed, keeping the record
    /// of which fields were typed by the user.
    pub fn restore(&mut self, key: &SetKey, values: &MetricValues) {
        let entry = self.entry_mut(key);
        for field in MetricField::PERFORMANCE {
            if let Some(value) = values.get(field) {
                entry.values.set(field, Some(value));
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
