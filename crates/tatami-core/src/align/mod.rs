//! Tabular alignment of token partitions.
//!
//! Given one partition-tree node whose children are candidate rows, this
//! pass adjusts the leading spaces of selected tokens so that
//! syntactically-corresponding columns line up vertically across rows,
//! e.g. the `=` of a run of assignments or the names in a port list.
//!
//! The pipeline per group of rows:
//!
//! 1. split the children into groups separated by blank lines;
//! 2. skip groups overlapping format-disabled byte ranges;
//! 3. drop ignored rows and require the rest to share a syntax node kind;
//! 4. run the caller's cell scanner over each row to sample sparse column
//!    proposals keyed by syntax tree path;
//! 5. union the proposals into an ordered column schema and project every
//!    row onto it as a dense row of cells;
//! 6. compute per-cell and per-column widths;
//! 7. refuse the group if any fully-aligned row would exceed the column
//!    limit;
//! 8. rewrite the leading spaces of each populated cell's first token.
//!
//! A group that cannot be aligned is left byte-for-byte untouched; there is
//! no partial alignment. What *which* tokens start columns means is
//! language-specific and supplied by the caller as a scanner function,
//! typically built on [`ColumnSchemaScanner`].

mod column;
mod matrix;

use thiserror::Error;
use tracing::{debug, trace};

use rowan::SyntaxKind;

use crate::config::AlignmentConfig;
use crate::interval_set::ByteOffsetSet;
use crate::partition::{TokenPartitionTree, UnwrappedLine};
use crate::syntax::{SymbolId, SyntaxTree, SyntaxTreePath};
use crate::token::{PreFormatToken, TokenInfo, TokenRange};

use column::ColumnSchemaAggregator;
use matrix::{
    AlignmentMatrix, AlignmentRowData, align_row_spacings, compute_cell_widths,
    compute_column_widths, effective_cell_width, fill_alignment_row, row_excerpt,
};

/// How padding is distributed when a column is wider than a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentColumnProperties {
    /// With `flush_left`, cell content sits at the column's left edge and
    /// padding trails it (spilling into following empty columns); otherwise
    /// padding precedes the content, right-aligning it.
    pub flush_left: bool,
}

impl Default for AlignmentColumnProperties {
    fn default() -> Self {
        Self { flush_left: true }
    }
}

impl AlignmentColumnProperties {
    pub fn flush_right() -> Self {
        Self { flush_left: false }
    }
}

/// One cell boundary proposed by a scanner for one row.
#[derive(Debug, Clone)]
pub struct ColumnPositionEntry {
    /// Position in the syntax tree; establishes the total order of columns
    /// across rows with optional or repeated constructs.
    pub path: SyntaxTreePath,
    /// Token at which the cell starts, identified by its source span.
    pub starting_token: TokenInfo,
    pub properties: AlignmentColumnProperties,
}

/// Collector that language-specific scanners drive while walking a row's
/// syntax subtree.
///
/// Scanners call [`reserve_new_column`](Self::reserve_new_column) at each
/// position that should start a cell; the collector handles empty subtrees
/// and path fusion, and yields the row's sparse entries in emission order.
#[derive(Debug, Default)]
pub struct ColumnSchemaScanner {
    sparse_columns: Vec<ColumnPositionEntry>,
}

impl ColumnSchemaScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposes a new cell starting at the leftmost leaf of `symbol`.
    ///
    /// A symbol with no leaves below it matched nothing in this row and is
    /// ignored. A `path` equal to the previous entry's fuses the two
    /// syntactic positions into one cell: the earlier, leftmost token is
    /// kept and this proposal is dropped.
    pub fn reserve_new_column(
        &mut self,
        tree: &SyntaxTree,
        symbol: SymbolId,
        properties: AlignmentColumnProperties,
        path: SyntaxTreePath,
    ) {
        let Some(leaf) = tree.leftmost_leaf(symbol) else {
            return;
        };
        if self
            .sparse_columns
            .last()
            .is_none_or(|prev| prev.path != path)
        {
            trace!("reserving new column at {path}");
            self.sparse_columns.push(ColumnPositionEntry {
                path,
                starting_token: leaf.clone(),
                properties,
            });
        }
    }

    /// The row's sparse entries, paths in emission order.
    pub fn into_sparse_columns(self) -> Vec<ColumnPositionEntry> {
        self.sparse_columns
    }
}

/// Why a group of rows was left unaligned.
///
/// These are expected outcomes, not errors; they surface only as unchanged
/// spacing and a debug log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbandonReason {
    /// Rows originate from syntax nodes of different kinds and therefore
    /// have no corresponding columns.
    #[error("rows have mismatched syntax node kinds ({first:?} vs {other:?})")]
    MismatchedNodeKinds { first: SyntaxKind, other: SyntaxKind },
    /// Fully aligning the group would push some row past the column limit.
    #[error("aligned width {width} exceeds the column limit {limit}")]
    OverColumnLimit { width: usize, limit: usize },
}

/// Aligns the children of `partition` in place.
///
/// * `alignment_scanner` samples one row's cell boundaries from its syntax
///   subtree (see [`ColumnSchemaScanner`]).
/// * `ignore_pred` drops rows that never participate in alignment, such as
///   comment-only partitions.
/// * `ftokens` is the stream the partitions index into; only
///   `before.spaces_required` of cell-starting tokens is written.
/// * `disabled_byte_ranges` holds regions where the user switched
///   formatting off; any group touching one is skipped whole.
///
/// Groups are processed independently: one group failing its width budget
/// or node-kind check does not affect its neighbors.
pub fn tabular_align_tokens<Scanner, Ignore>(
    partition: &TokenPartitionTree,
    alignment_scanner: Scanner,
    ignore_pred: Ignore,
    ftokens: &mut [PreFormatToken],
    syntax: &SyntaxTree,
    source: &str,
    disabled_byte_ranges: &ByteOffsetSet,
    config: &AlignmentConfig,
) where
    Scanner: Fn(&TokenPartitionTree) -> Vec<ColumnPositionEntry>,
    Ignore: Fn(&TokenPartitionTree) -> bool,
{
    if !config.enabled {
        return;
    }
    let subpartitions = partition.children();
    if subpartitions.is_empty() {
        return;
    }
    let mut pass = AlignmentPass {
        syntax,
        source,
        disabled_byte_ranges,
        column_limit: config.column_limit,
        ftokens,
    };
    pass.run(subpartitions, &alignment_scanner, &ignore_pred);
}

/// Shared state of one alignment invocation.
struct AlignmentPass<'a> {
    syntax: &'a SyntaxTree,
    source: &'a str,
    disabled_byte_ranges: &'a ByteOffsetSet,
    column_limit: usize,
    ftokens: &'a mut [PreFormatToken],
}

impl AlignmentPass<'_> {
    fn run<Scanner, Ignore>(
        &mut self,
        subpartitions: &[TokenPartitionTree],
        scanner: &Scanner,
        ignore: &Ignore,
    ) where
        Scanner: Fn(&TokenPartitionTree) -> Vec<ColumnPositionEntry>,
        Ignore: Fn(&TokenPartitionTree) -> bool,
    {
        let boundaries = self.find_group_boundaries(subpartitions);
        debug_assert!(boundaries.len() >= 2);
        debug!("alignment group boundaries: {boundaries:?}");
        for window in boundaries.windows(2) {
            let group = &subpartitions[window[0]..window[1]];
            if group.is_empty() {
                continue;
            }
            if self.any_subrange_disabled(group) {
                debug!("skipping group intersecting a format-disabled region");
                continue;
            }
            self.align_partition_group(group, scanner, ignore);
        }
    }

    /// Indices subdividing `subpartitions` into groups separated by blank
    /// lines. A blank line exists between two adjacent partitions when the
    /// source text between them contains two or more newlines. The first
    /// boundary is 0 and the last is `subpartitions.len()`; empty input
    /// yields no boundaries at all.
    fn find_group_boundaries(&self, subpartitions: &[TokenPartitionTree]) -> Vec<usize> {
        let mut boundaries = Vec::with_capacity(subpartitions.len() + 1);
        if subpartitions.is_empty() {
            return boundaries;
        }
        boundaries.push(0);
        let mut previous_end = None;
        for (index, part) in subpartitions.iter().enumerate() {
            let range = part.value().tokens_range();
            if range.is_empty() {
                continue;
            }
            let begin = self.ftokens[range.start].token.span.start();
            let end = self.ftokens[range.end - 1].token.span.end();
            if let Some(previous) = previous_end {
                let gap = &self.source[rowan::TextRange::new(previous, begin)];
                if gap.matches('\n').count() >= 2 {
                    boundaries.push(index);
                }
            }
            previous_end = Some(end);
        }
        boundaries.push(subpartitions.len());
        boundaries
    }

    /// Source byte span from the first token of the group's first partition
    /// to the last token of its last partition.
    fn string_span_of_partition_range(&self, group: &[TokenPartitionTree]) -> std::ops::Range<u32> {
        let front = group
            .first()
            .expect("partition group must not be empty")
            .value()
            .tokens_range();
        let back = group
            .last()
            .expect("partition group must not be empty")
            .value()
            .tokens_range();
        assert!(!front.is_empty(), "group begins with a token-less partition");
        assert!(!back.is_empty(), "group ends with a token-less partition");
        let start = u32::from(self.ftokens[front.start].token.span.start());
        let end = u32::from(self.ftokens[back.end - 1].token.span.end());
        start..end
    }

    /// True if any part of the group's source span is format-disabled.
    fn any_subrange_disabled(&self, group: &[TokenPartitionTree]) -> bool {
        let span = self.string_span_of_partition_range(group);
        let enabled = self.disabled_byte_ranges.complement(span.clone());
        enabled != ByteOffsetSet::from(span)
    }

    fn align_partition_group<Scanner, Ignore>(
        &mut self,
        group: &[TokenPartitionTree],
        scanner: &Scanner,
        ignore: &Ignore,
    ) where
        Scanner: Fn(&TokenPartitionTree) -> Vec<ColumnPositionEntry>,
        Ignore: Fn(&TokenPartitionTree) -> bool,
    {
        debug!("aligning group of {} partition(s)", group.len());
        let rows: Vec<&TokenPartitionTree> =
            group.iter().filter(|part| !ignore(part)).collect();
        if let Err(reason) = self.align_qualified_rows(&rows, scanner) {
            debug!("group left unaligned: {reason}");
        }
    }

    /// Node kind at a row's origin. Qualified rows must originate from a
    /// syntax node; anything else is a partitioner bug.
    fn partition_node_kind(&self, part: &TokenPartitionTree) -> SyntaxKind {
        let origin = part
            .value()
            .origin()
            .expect("aligned rows must carry a syntax tree origin");
        self.syntax
            .node_kind(origin)
            .expect("row origin must be a syntax node, not a leaf")
    }

    fn verify_row_node_kinds(&self, rows: &[&TokenPartitionTree]) -> Result<(), AbandonReason> {
        let first = self.partition_node_kind(rows[0]);
        for row in &rows[1..] {
            let other = self.partition_node_kind(row);
            if other != first {
                return Err(AbandonReason::MismatchedNodeKinds { first, other });
            }
        }
        Ok(())
    }

    /// A row's tokens restricted to the span of its origin subtree.
    ///
    /// The partition may hold trailing tokens that sit outside the origin,
    /// such as a separating comma; those are excluded by scanning backward
    /// until the origin's rightmost leaf is found.
    fn qualified_token_range(&self, line: &UnwrappedLine) -> TokenRange {
        let origin = line
            .origin()
            .expect("aligned rows must carry a syntax tree origin");
        let last_leaf = self
            .syntax
            .rightmost_leaf(origin)
            .expect("row origin subtree has no leaves");
        let range = line.tokens_range();
        let mut end = range.end;
        loop {
            assert!(
                end > range.start,
                "rightmost leaf of the row origin not found among the row's tokens"
            );
            if self.ftokens[end - 1].token.span == last_leaf.span {
                break;
            }
            end -= 1;
        }
        range.start..end
    }

    fn align_qualified_rows<Scanner>(
        &mut self,
        rows: &[&TokenPartitionTree],
        scanner: &Scanner,
    ) -> Result<(), AbandonReason>
    where
        Scanner: Fn(&TokenPartitionTree) -> Vec<ColumnPositionEntry>,
    {
        // Alignment requires something to align to.
        if rows.len() <= 1 {
            return Ok(());
        }
        self.verify_row_node_kinds(rows)?;

        // Sample each row's subtree, building the union schema as we go so
        // that a column wanted by *any* row exists for all of them.
        let mut schema_aggregator = ColumnSchemaAggregator::default();
        let mut row_data = Vec::with_capacity(rows.len());
        for row in rows {
            let data = AlignmentRowData {
                tokens: self.qualified_token_range(row.value()),
                sparse_columns: scanner(row),
            };
            schema_aggregator.collect(&data.sparse_columns);
            row_data.push(data);
        }
        debug!(
            "unique columns: {}",
            schema_aggregator.num_unique_columns()
        );
        let schema = schema_aggregator.finalize();
        let num_columns = schema.positions.len();
        if num_columns == 0 {
            return Ok(());
        }

        // Dense matrix over the schema; absent cells become empty ranges.
        let mut matrix: AlignmentMatrix = Vec::with_capacity(row_data.len());
        for data in &row_data {
            let row = fill_alignment_row(data, &schema.positions, self.ftokens);
            trace!("row: {}", row_excerpt(&row, self.ftokens, self.source));
            matrix.push(row);
        }

        compute_cell_widths(&mut matrix, self.ftokens, self.source);
        let column_configs = compute_column_widths(&matrix, num_columns);

        // Indentation is uniform within a group; take the first row's.
        let indentation = rows[0].value().indentation_spaces();
        let total_column_width = indentation
            + column_configs
                .iter()
                .map(|config| config.total_width())
                .sum::<usize>();
        debug!("total aligned column width: {total_column_width}");
        if total_column_width > self.column_limit {
            return Err(AbandonReason::OverColumnLimit {
                width: total_column_width,
                limit: self.column_limit,
            });
        }
        // The columns alone may fit while a row's unaligned epilog (tokens
        // past its last cell, e.g. a trailing comma or comment) pushes that
        // row over the limit.
        for (row, part) in matrix.iter().zip(rows) {
            let Some(last_cell) = row.last() else {
                continue;
            };
            let partition_end = part.value().tokens_range().end;
            let epilog = &self.ftokens[last_cell.tokens.end..partition_end];
            let aligned_partition_width =
                total_column_width + effective_cell_width(epilog, self.source);
            if aligned_partition_width > self.column_limit {
                return Err(AbandonReason::OverColumnLimit {
                    width: aligned_partition_width,
                    limit: self.column_limit,
                });
            }
        }

        for row in &matrix {
            align_row_spacings(&column_configs, &schema.properties, row, self.ftokens);
        }
        Ok(())
    }
}
