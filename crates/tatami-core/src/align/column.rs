//! Aggregation of per-row cell proposals into a global column schema.

use std::collections::BTreeMap;

use tracing::trace;

use super::matrix::AlignmentCell;
use super::{AlignmentColumnProperties, ColumnPositionEntry};
use crate::syntax::SyntaxTreePath;
use crate::token::TokenInfo;

/// Everything observed for one column position across all rows.
#[derive(Debug, Clone, Default)]
pub(crate) struct AggregateColumnData {
    /// Taken from the first row that proposed this column. Scanners are
    /// trusted to be consistent across rows; later properties are ignored.
    properties: AlignmentColumnProperties,
    /// Starting tokens observed at this position, one per proposing row.
    starting_tokens: Vec<TokenInfo>,
}

impl AggregateColumnData {
    fn import(&mut self, cell: &ColumnPositionEntry) {
        if self.starting_tokens.is_empty() {
            self.properties = cell.properties;
        }
        self.starting_tokens.push(cell.starting_token.clone());
    }
}

/// Unions the sparse column proposals of every row into one ordered schema.
///
/// Keys are syntax tree paths, so the resulting column order follows the
/// paths' lexicographic order regardless of which rows proposed which
/// columns.
#[derive(Debug, Default)]
pub(crate) struct ColumnSchemaAggregator {
    cell_map: BTreeMap<SyntaxTreePath, AggregateColumnData>,
}

impl ColumnSchemaAggregator {
    pub(crate) fn collect(&mut self, row: &[ColumnPositionEntry]) {
        for cell in row {
            self.cell_map.entry(cell.path.clone()).or_default().import(cell);
        }
    }

    pub(crate) fn num_unique_columns(&self) -> usize {
        self.cell_map.len()
    }

    /// Fixes the 1:1 mapping between paths and column indices.
    pub(crate) fn finalize(self) -> ColumnSchema {
        let mut positions = Vec::with_capacity(self.cell_map.len());
        let mut properties = Vec::with_capacity(self.cell_map.len());
        for (path, data) in self.cell_map {
            trace!(
                "column {path} proposed by {} row(s)",
                data.starting_tokens.len()
            );
            positions.push(path);
            properties.push(data.properties);
        }
        ColumnSchema {
            positions,
            properties,
        }
    }
}

/// Final ordered column schema: paths ascending, properties parallel.
#[derive(Debug)]
pub(crate) struct ColumnSchema {
    pub(crate) positions: Vec<SyntaxTreePath>,
    pub(crate) properties: Vec<AlignmentColumnProperties>,
}

/// Widths aggregated per column across all rows of the matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AlignedColumnConfiguration {
    pub(crate) width: usize,
    pub(crate) left_border: usize,
}

impl AlignedColumnConfiguration {
    pub(crate) fn total_width(&self) -> usize {
        self.left_border + self.width
    }

    pub(crate) fn update_from_cell(&mut self, cell: &AlignmentCell) {
        self.width = self.width.max(cell.compact_width);
        self.left_border = self.left_border.max(cell.left_border_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::{SyntaxKind, TextRange, TextSize};

    fn entry(path: Vec<u32>, start: u32, flush_left: bool) -> ColumnPositionEntry {
        ColumnPositionEntry {
            path: SyntaxTreePath::from(path),
            starting_token: TokenInfo::new(
                SyntaxKind(1),
                TextRange::new(TextSize::from(start), TextSize::from(start + 1)),
            ),
            properties: AlignmentColumnProperties { flush_left },
        }
    }

    #[test]
    fn columns_union_across_rows_in_path_order() {
        let mut aggregator = ColumnSchemaAggregator::default();
        aggregator.collect(&[entry(vec![0], 0, true), entry(vec![2], 4, true)]);
        aggregator.collect(&[entry(vec![1], 10, true)]);
        assert_eq!(aggregator.num_unique_columns(), 3);

        let schema = aggregator.finalize();
        assert_eq!(
            schema.positions,
            vec![
                SyntaxTreePath::from(vec![0]),
                SyntaxTreePath::from(vec![1]),
                SyntaxTreePath::from(vec![2]),
            ]
        );
    }

    #[test]
    fn first_seen_properties_win() {
        let mut aggregator = ColumnSchemaAggregator::default();
        aggregator.collect(&[entry(vec![0], 0, false)]);
        aggregator.collect(&[entry(vec![0], 8, true)]);

        let schema = aggregator.finalize();
        assert!(!schema.properties[0].flush_left);
    }

    #[test]
    fn column_configuration_takes_maxima() {
        let mut config = AlignedColumnConfiguration::default();
        config.update_from_cell(&AlignmentCell {
            tokens: 0..1,
            compact_width: 5,
            left_border_width: 0,
        });
        config.update_from_cell(&AlignmentCell {
            tokens: 1..3,
            compact_width: 3,
            left_border_width: 2,
        });
        assert_eq!(config.width, 5);
        assert_eq!(config.left_border, 2);
        assert_eq!(config.total_width(), 7);
    }
}
