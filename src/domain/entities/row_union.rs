/// Rows collected for one bulk delete.
///
/// Row numbers all refer to the sheet as it is before the delete runs, so a
/// union must be flushed before any row at or above its lowest member moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowUnion {
    rows: Vec<u32>,
}

impl RowUnion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: u32) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn take(&mut self) -> RowUnion {
        std::mem::take(self)
    }

    /// Contiguous `(first, last)` spans, bottom of the sheet first.
    pub fn spans(&self) -> Vec<(u32, u32)> {
        let mut rows = self.rows.clone();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();

        let mut spans: Vec<(u32, u32)> = Vec::new();
        for row in rows {
            match spans.last_mut() {
                Some((first, _)) if *first == row + 1 => *first = row,
                _ => spans.push((row, row)),
            }
        }
        spans
    }
}

impl FromIterator<u32> for RowUnion {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_coalesce_contiguous_rows_from_the_bottom() {
        let union: RowUnion = [20, 19, 18, 15, 12, 11].into_iter().collect();
        assert_eq!(union.spans(), vec![(18, 20), (15, 15), (11, 12)]);
    }

    #[test]
    fn spans_ignore_duplicates_and_input_order() {
        let union: RowUnion = [3, 5, 4, 4, 9].into_iter().collect();
        assert_eq!(union.spans(), vec![(9, 9), (3, 5)]);
    }

    #[test]
    fn take_leaves_an_empty_union() {
        let mut union: RowUnion = [1, 2].into_iter().collect();
        let taken = union.take();
        assert!(union.is_empty());
        assert_eq!(taken.len(), 2);
    }
}
