use std::collections::HashMap;

use crate::domain::entities::cell::Row;
use crate::domain::entities::params::{KeyColumn, StartRow};
use crate::domain::entities::partition::{FastPartition, KeyPartition, OwnershipMap};
use crate::domain::error::EngineError;

/// Splits rows into the header block and per-key buckets.
///
/// Rows above `start_row` are kept verbatim as the header. Data rows whose
/// key cell is blank are dropped.
pub fn partition_fast<I>(
    rows: I,
    start_row: StartRow,
    key_column: KeyColumn,
) -> Result<FastPartition, EngineError>
where
    I: IntoIterator<Item = Result<Row, EngineError>>,
{
    let mut header = Vec::new();
    let mut partitions: Vec<KeyPartition> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let row = row?;
        if row.number < start_row.get() {
            header.push(row);
            continue;
        }
        let Some(key) = row.key_at(key_column.get()) else {
            continue;
        };
        match index.get(&key) {
            Some(&idx) => partitions[idx].rows.push(row),
            None => {
                index.insert(key.clone(), partitions.len());
                partitions.push(KeyPartition {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    Ok(FastPartition { header, partitions })
}

/// One forward scan recording which key owns each data row.
pub fn build_ownership_map<I>(
    rows: I,
    start_row: StartRow,
    key_column: KeyColumn,
) -> Result<OwnershipMap, EngineError>
where
    I: IntoIterator<Item = Result<Row, EngineError>>,
{
    let mut map = OwnershipMap::new(start_row.get());
    for row in rows {
        let row = row?;
        if row.number < start_row.get() {
            continue;
        }
        if let Some(key) = row.key_at(key_column.get()) {
            map.assign(row.number, key);
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::cell::CellValue;

    fn row(number: u32, key: Option<&str>) -> Result<Row, EngineError> {
        Ok(Row::new(
            number,
            vec![
                Some(CellValue::Number(f64::from(number))),
                key.map(|k| CellValue::Text(k.to_string())),
            ],
        ))
    }

    fn sheet() -> Vec<Result<Row, EngineError>> {
        let mut rows: Vec<_> = (1..=8).map(|n| row(n, Some("标题"))).collect();
        rows.push(row(9, Some("A")));
        rows.push(row(10, Some("B")));
        rows.push(row(11, Some(" A ")));
        rows.push(row(12, Some("")));
        rows
    }

    fn params() -> (StartRow, KeyColumn) {
        (
            StartRow::new(9).expect("valid start row"),
            KeyColumn::new(2).expect("valid key column"),
        )
    }

    #[test]
    fn fast_partition_groups_by_trimmed_key() {
        let (start, key) = params();
        let result = partition_fast(sheet(), start, key).expect("partition should succeed");

        assert_eq!(result.header.len(), 8);
        let keys: Vec<&str> = result.partitions.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);

        let a_rows: Vec<u32> = result
            .get("A")
            .map(|p| p.rows.iter().map(|r| r.number).collect())
            .unwrap_or_default();
        assert_eq!(a_rows, vec![9, 11]);
        assert_eq!(result.data_row_count(), 3, "blank key row 12 is dropped");
    }

    #[test]
    fn ownership_map_finds_last_keyed_row() {
        let (start, key) = params();
        let map = build_ownership_map(sheet(), start, key).expect("scan should succeed");

        assert_eq!(map.max_data_row(), Some(11));
        assert_eq!(map.owner(11), Some("A"));
        assert_eq!(map.owner(12), None);
        assert_eq!(map.owner(3), None, "header rows are never owned");
    }

    #[test]
    fn no_data_rows_means_no_partitions() {
        let (start, key) = params();
        let only_header = || (1..=8).map(|n| row(n, Some("x")));

        let fast = partition_fast(only_header(), start, key).expect("partition should succeed");
        assert!(fast.partitions.is_empty());
        assert_eq!(fast.header.len(), 8);

        let map = build_ownership_map(only_header(), start, key).expect("scan should succeed");
        assert!(map.keys().is_empty());
    }

    #[test]
    fn reader_errors_propagate() {
        let (start, key) = params();
        let rows = vec![row(1, None), Err(EngineError::unreadable("x.xlsx", "truncated"))];

        let result = partition_fast(rows, start, key);
        assert!(matches!(result, Err(EngineError::UnreadableFile { .. })));
    }
}
