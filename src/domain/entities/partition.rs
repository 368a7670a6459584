use std::collections::BTreeMap;

use crate::domain::entities::cell::Row;

/// Rows belonging to one key, in sheet order.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPartition {
    pub key: String,
    pub rows: Vec<Row>,
}

/// Result of a values-only partition pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FastPartition {
    /// Every row above the start row, verbatim.
    pub header: Vec<Row>,
    /// Keys in first-appearance order.
    pub partitions: Vec<KeyPartition>,
}

impl FastPartition {
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&KeyPartition> {
        self.partitions.iter().find(|p| p.key == key)
    }

    pub fn data_row_count(&self) -> usize {
        self.partitions.iter().map(|p| p.rows.len()).sum()
    }
}

/// Row number to owning key, for rows at or after the start row.
///
/// A row without an entry has a blank key cell and is removed from every
/// per-key output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnershipMap {
    start_row: u32,
    max_data_row: u32,
    owners: BTreeMap<u32, String>,
    keys: Vec<String>,
}

impl OwnershipMap {
    pub fn new(start_row: u32) -> Self {
        Self {
            start_row,
            ..Self::default()
        }
    }

    pub fn assign(&mut self, row: u32, key: String) {
        if !self.keys.contains(&key) {
            self.keys.push(key.clone());
        }
        self.max_data_row = self.max_data_row.max(row);
        self.owners.insert(row, key);
    }

    /// Highest keyed row, `None` when no data row has a key.
    pub fn max_data_row(&self) -> Option<u32> {
        (self.max_data_row > 0).then_some(self.max_data_row)
    }

    pub fn owner(&self, row: u32) -> Option<&str> {
        self.owners.get(&row).map(String::as_str)
    }

    /// Distinct keys in first-appearance order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[cfg(test)]
    pub fn rows_of(&self, key: &str) -> Vec<u32> {
        self.owners
            .iter()
            .filter(|(_, owner)| owner.as_str() == key)
            .map(|(row, _)| *row)
            .collect()
    }

    /// Rows that must go from the output for `key`, highest first.
    ///
    /// Deleting in this order keeps every not-yet-deleted row number valid.
    pub fn rows_to_delete_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = u32> + 'a {
        let last = self.max_data_row;
        let first = self.start_row;
        (first..=last)
            .rev()
            .filter(move |row| self.owner(*row) != Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OwnershipMap {
        let mut map = OwnershipMap::new(9);
        map.assign(9, "A".to_string());
        map.assign(10, "B".to_string());
        map.assign(11, "A".to_string());
        map
    }

    #[test]
    fn keys_keep_first_appearance_order() {
        let map = sample();
        assert_eq!(map.keys(), ["A".to_string(), "B".to_string()]);
        assert_eq!(map.max_data_row(), Some(11));
        assert_eq!(map.rows_of("A").into_iter().collect::<Vec<_>>(), vec![9, 11]);
    }

    #[test]
    fn deletion_candidates_are_descending_and_include_ownerless_rows() {
        let mut map = sample();
        map.assign(13, "B".to_string());

        let for_a: Vec<u32> = map.rows_to_delete_for("A").collect();
        assert_eq!(for_a, vec![13, 12, 10]);

        let for_b: Vec<u32> = map.rows_to_delete_for("B").collect();
        assert_eq!(for_b, vec![12, 11, 9]);
    }

    #[test]
    fn empty_map_has_no_boundary() {
        let map = OwnershipMap::new(2);
        assert!(map.keys().is_empty());
        assert_eq!(map.max_data_row(), None);
        assert_eq!(map.rows_to_delete_for("x").count(), 0);
    }
}
