//! Dense alignment matrix: sparse row proposals projected onto the global
//! column schema, width arithmetic, and the spacing rewrite.

use tracing::trace;

use super::column::AlignedColumnConfiguration;
use super::{AlignmentColumnProperties, ColumnPositionEntry};
use crate::syntax::SyntaxTreePath;
use crate::token::{PreFormatToken, TokenRange};

/// One cell of the matrix: a half-open token range inside a row.
///
/// An empty range means the row has nothing at this column; the range still
/// points at the position in the token stream where the column's content
/// would go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AlignmentCell {
    pub(crate) tokens: TokenRange,
    /// Width of the cell's tokens under minimum inter-token spacing.
    pub(crate) compact_width: usize,
    /// Spaces required before the cell's first token.
    pub(crate) left_border_width: usize,
}

impl AlignmentCell {
    fn empty_at(index: usize) -> Self {
        Self {
            tokens: index..index,
            compact_width: 0,
            left_border_width: 0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn update_widths(&mut self, ftokens: &[PreFormatToken], source: &str) {
        let tokens = &ftokens[self.tokens.clone()];
        self.compact_width = effective_cell_width(tokens, source);
        self.left_border_width = effective_left_border_width(tokens);
    }
}

pub(crate) type AlignmentRow = Vec<AlignmentCell>;
pub(crate) type AlignmentMatrix = Vec<AlignmentRow>;

/// Per-row input to the matrix: the qualified token range plus the sparse
/// cell proposals the scanner produced for that row.
#[derive(Debug)]
pub(crate) struct AlignmentRowData {
    pub(crate) tokens: TokenRange,
    pub(crate) sparse_columns: Vec<ColumnPositionEntry>,
}

/// Width of a token excerpt under minimum required spacing: the sum of
/// token widths and their leading spaces, excluding the first token's
/// leading spaces.
pub(crate) fn effective_cell_width(tokens: &[PreFormatToken], source: &str) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    let total: usize = tokens
        .iter()
        .map(|ftoken| ftoken.leading_spaces() + ftoken.width(source))
        .sum();
    total - tokens[0].leading_spaces()
}

fn effective_left_border_width(tokens: &[PreFormatToken]) -> usize {
    tokens.first().map_or(0, PreFormatToken::leading_spaces)
}

/// Translates one row's sparse column proposals into a dense row of cells
/// over the aggregated schema.
///
/// Cells for columns the row does not populate become empty ranges anchored
/// at the token position where that column's content would start. A second,
/// reverse pass derives every cell's upper bound from its right neighbor.
///
/// # Panics
///
/// Panics if a sparse entry's path is missing from `column_positions`
/// (impossible when the schema was aggregated from these rows), or if a
/// starting token cannot be found in the row's token range (scanner
/// contract violation).
pub(crate) fn fill_alignment_row(
    row_data: &AlignmentRowData,
    column_positions: &[SyntaxTreePath],
    ftokens: &[PreFormatToken],
) -> AlignmentRow {
    let token_range = row_data.tokens.clone();
    let mut row: AlignmentRow = vec![AlignmentCell::empty_at(token_range.end); column_positions.len()];

    let mut pos_cursor = 0usize;
    let mut token_cursor = token_range.start;
    let mut last_column_index = 0usize;
    for col in &row_data.sparse_columns {
        let advance = column_positions[pos_cursor..]
            .iter()
            .position(|path| *path == col.path)
            .unwrap_or_else(|| {
                panic!(
                    "scanner path {} missing from the aggregated column schema",
                    col.path
                )
            });
        pos_cursor += advance;
        let column_index = pos_cursor;
        trace!("cell at column {column_index}");

        // Locate the pre-format token the cell starts at. Linear over the
        // whole row across all iterations.
        token_cursor = (token_cursor..token_range.end)
            .find(|&index| ftokens[index].token.span == col.starting_token.span)
            .unwrap_or_else(|| {
                panic!(
                    "starting token for column {} not found in the row's token range",
                    col.path
                )
            });

        // Anchor skipped columns, and this cell's lower bound, at the
        // current token. A repeated path leaves the earlier anchor in
        // place, fusing the two proposals into one cell.
        while last_column_index <= column_index {
            row[last_column_index].tokens = token_cursor..token_cursor;
            last_column_index += 1;
        }
    }
    // Cells right of the last proposal stay empty at the row's end, as
    // initialized.

    // Reverse pass: each cell ends where the next one starts.
    let mut upper_bound = token_range.end;
    for cell in row.iter_mut().rev() {
        cell.tokens.end = upper_bound;
        upper_bound = cell.tokens.start;
    }
    row
}

pub(crate) fn compute_cell_widths(
    matrix: &mut AlignmentMatrix,
    ftokens: &[PreFormatToken],
    source: &str,
) {
    for row in matrix.iter_mut() {
        for cell in row.iter_mut() {
            cell.update_widths(ftokens, source);
        }
    }
    trace!("cell sizes:\n{}", cell_sizes_summary(matrix));
}

pub(crate) fn compute_column_widths(
    matrix: &AlignmentMatrix,
    num_columns: usize,
) -> Vec<AlignedColumnConfiguration> {
    let mut configs = vec![AlignedColumnConfiguration::default(); num_columns];
    for row in matrix {
        for (config, cell) in configs.iter_mut().zip(row) {
            config.update_from_cell(cell);
        }
    }
    configs
}

/// Rewrites the leading spaces of one row's cell-starting tokens so the row
/// realizes the aligned column widths.
///
/// `accrued_spaces` carries the width of empty columns forward into the
/// next populated cell, and the padding of flush-left cells forward past
/// their content.
pub(crate) fn align_row_spacings(
    configs: &[AlignedColumnConfiguration],
    properties: &[AlignmentColumnProperties],
    row: &AlignmentRow,
    ftokens: &mut [PreFormatToken],
) {
    let mut accrued_spaces = 0usize;
    for ((cell, config), props) in row.iter().zip(configs).zip(properties) {
        accrued_spaces += config.left_border;
        if cell.is_empty() {
            // Push this column's full width into the next populated cell.
            accrued_spaces += config.width;
        } else {
            let padding = config.width - cell.compact_width;
            let spacing = &mut ftokens[cell.tokens.start].before;
            if props.flush_left {
                spacing.spaces_required = accrued_spaces;
                accrued_spaces = padding;
            } else {
                spacing.spaces_required = accrued_spaces + padding;
                accrued_spaces = 0;
            }
            trace!(
                "column spacing set to {} at token {}",
                spacing.spaces_required, cell.tokens.start
            );
        }
    }
}

/// Cell sizes of every row, for trace output: one `[lb+w, ...]` per row.
fn cell_sizes_summary(matrix: &AlignmentMatrix) -> String {
    let mut out = String::new();
    for row in matrix {
        out.push('[');
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!(
                "{}+{}",
                cell.left_border_width, cell.compact_width
            ));
        }
        out.push_str("]\n");
    }
    out
}

/// Token texts of one row's cells, for trace output.
pub(crate) fn row_excerpt(row: &AlignmentRow, ftokens: &[PreFormatToken], source: &str) -> String {
    let cells: Vec<String> = row
        .iter()
        .map(|cell| {
            ftokens[cell.tokens.clone()]
                .iter()
                .map(|ftoken| ftoken.text(source))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    format!("< {} >", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenInfo;
    use rowan::{SyntaxKind, TextRange, TextSize};

    const WORD: SyntaxKind = SyntaxKind(1);

    /// One single-character token per byte of `source`, one space required
    /// between consecutive tokens.
    fn char_tokens(count: u32) -> Vec<PreFormatToken> {
        (0..count)
            .map(|i| {
                let mut ftoken = PreFormatToken::new(TokenInfo::new(
                    WORD,
                    TextRange::new(TextSize::from(i), TextSize::from(i + 1)),
                ));
                if i > 0 {
                    ftoken.before.spaces_required = 1;
                }
                ftoken
            })
            .collect()
    }

    fn paths(steps: &[u32]) -> Vec<SyntaxTreePath> {
        steps.iter().map(|&s| SyntaxTreePath::from(vec![s])).collect()
    }

    fn entry(step: u32, ftoken: &PreFormatToken) -> ColumnPositionEntry {
        ColumnPositionEntry {
            path: SyntaxTreePath::from(vec![step]),
            starting_token: ftoken.token.clone(),
            properties: AlignmentColumnProperties::default(),
        }
    }

    #[test]
    fn fill_projects_sparse_entries_onto_schema() {
        let ftokens = char_tokens(4);
        let row_data = AlignmentRowData {
            tokens: 0..4,
            sparse_columns: vec![entry(0, &ftokens[0]), entry(2, &ftokens[2])],
        };
        let row = fill_alignment_row(&row_data, &paths(&[0, 1, 2]), &ftokens);

        assert_eq!(row[0].tokens, 0..2);
        // The skipped middle column is an empty range anchored where its
        // content would start.
        assert_eq!(row[1].tokens, 2..2);
        assert_eq!(row[2].tokens, 2..4);
    }

    #[test]
    fn fill_without_entries_leaves_all_cells_empty() {
        let ftokens = char_tokens(3);
        let row_data = AlignmentRowData {
            tokens: 0..3,
            sparse_columns: Vec::new(),
        };
        let row = fill_alignment_row(&row_data, &paths(&[0, 1]), &ftokens);
        assert!(row.iter().all(|cell| cell.tokens == (3..3)));
    }

    #[test]
    fn fill_fuses_repeated_paths_keeping_the_first_anchor() {
        let ftokens = char_tokens(4);
        let row_data = AlignmentRowData {
            tokens: 0..4,
            sparse_columns: vec![
                entry(0, &ftokens[0]),
                entry(1, &ftokens[1]),
                entry(1, &ftokens[2]),
            ],
        };
        let row = fill_alignment_row(&row_data, &paths(&[0, 1]), &ftokens);
        assert_eq!(row[0].tokens, 0..1);
        assert_eq!(row[1].tokens, 1..4);
    }

    #[test]
    #[should_panic(expected = "not found in the row's token range")]
    fn fill_rejects_unknown_starting_token() {
        let ftokens = char_tokens(3);
        let stray = PreFormatToken::new(TokenInfo::new(
            WORD,
            TextRange::new(TextSize::from(90), TextSize::from(91)),
        ));
        let row_data = AlignmentRowData {
            tokens: 0..3,
            sparse_columns: vec![entry(0, &stray)],
        };
        fill_alignment_row(&row_data, &paths(&[0]), &ftokens);
    }

    #[test]
    fn effective_widths() {
        let source = "ab c";
        let mut ftokens = vec![
            PreFormatToken::new(TokenInfo::new(
                WORD,
                TextRange::new(TextSize::from(0), TextSize::from(2)),
            )),
            PreFormatToken::new(TokenInfo::new(
                WORD,
                TextRange::new(TextSize::from(3), TextSize::from(4)),
            )),
        ];
        ftokens[0].before.spaces_required = 2;
        ftokens[1].before.spaces_required = 1;

        // First token's leading spaces belong to the border, not the cell.
        assert_eq!(effective_cell_width(&ftokens, source), 4);
        assert_eq!(effective_left_border_width(&ftokens), 2);
        assert_eq!(effective_cell_width(&[], source), 0);
        assert_eq!(effective_left_border_width(&[]), 0);
    }

    #[test]
    fn spacing_rewrite_flush_left_spills_padding() {
        let mut ftokens = char_tokens(2);
        let row = vec![
            AlignmentCell {
                tokens: 0..1,
                compact_width: 2,
                left_border_width: 0,
            },
            AlignmentCell {
                tokens: 1..2,
                compact_width: 1,
                left_border_width: 1,
            },
        ];
        let configs = vec![
            AlignedColumnConfiguration {
                width: 4,
                left_border: 0,
            },
            AlignedColumnConfiguration {
                width: 3,
                left_border: 1,
            },
        ];
        let properties = vec![AlignmentColumnProperties::default(); 2];
        align_row_spacings(&configs, &properties, &row, &mut ftokens);

        assert_eq!(ftokens[0].before.spaces_required, 0);
        // Padding of the first cell (2) plus the second column's border (1).
        assert_eq!(ftokens[1].before.spaces_required, 3);
    }

    #[test]
    fn spacing_rewrite_flush_right_pads_before_content() {
        let mut ftokens = char_tokens(2);
        let row = vec![
            AlignmentCell {
                tokens: 0..1,
                compact_width: 2,
                left_border_width: 0,
            },
            AlignmentCell {
                tokens: 1..2,
                compact_width: 1,
                left_border_width: 1,
            },
        ];
        let configs = vec![
            AlignedColumnConfiguration {
                width: 4,
                left_border: 0,
            },
            AlignedColumnConfiguration {
                width: 3,
                left_border: 1,
            },
        ];
        let properties = vec![
            AlignmentColumnProperties::default(),
            AlignmentColumnProperties { flush_left: false },
        ];
        align_row_spacings(&configs, &properties, &row, &mut ftokens);

        // accrued (2 padding + 1 border) + right-flush padding (2).
        assert_eq!(ftokens[1].before.spaces_required, 5);
    }

    #[test]
    fn spacing_rewrite_skips_empty_cells() {
        let mut ftokens = char_tokens(2);
        ftokens[1].before.spaces_required = 1;
        let row = vec![
            AlignmentCell {
                tokens: 0..1,
                compact_width: 1,
                left_border_width: 0,
            },
            AlignmentCell::empty_at(1),
            AlignmentCell {
                tokens: 1..2,
                compact_width: 1,
                left_border_width: 1,
            },
        ];
        let configs = vec![
            AlignedColumnConfiguration {
                width: 1,
                left_border: 0,
            },
            AlignedColumnConfiguration {
                width: 4,
                left_border: 1,
            },
            AlignedColumnConfiguration {
                width: 1,
                left_border: 1,
            },
        ];
        let properties = vec![AlignmentColumnProperties::default(); 3];
        align_row_spacings(&configs, &properties, &row, &mut ftokens);

        // Empty middle column pushes its border + width into the last cell.
        assert_eq!(ftokens[1].before.spaces_required, 6);
    }
}
