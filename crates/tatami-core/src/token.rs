//! Pre-format tokens: the mutable spacing layer between lexing and
//! rendering.
//!
//! A [`PreFormatToken`] pairs the identity of a lexed token (kind plus its
//! byte span in the source text) with the spacing the formatter has decided
//! to place before it. Alignment mutates only the `spaces_required` field;
//! everything else on the token is left alone.
//!
//! Tokens live in one owned stream (`Vec<PreFormatToken>`), and all other
//! data structures refer to them by index. [`TokenRange`] is a half-open
//! index range into that stream.

use rowan::{SyntaxKind, TextRange};
use unicode_width::UnicodeWidthStr;

/// Half-open index range into the pre-format token stream.
pub type TokenRange = std::ops::Range<usize>;

/// Identity of a lexed token: its kind and byte span in the source text.
///
/// Two [`TokenInfo`]s denote the same source token iff their spans are
/// equal; token text is never compared by content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub kind: SyntaxKind,
    pub span: TextRange,
}

impl TokenInfo {
    pub fn new(kind: SyntaxKind, span: TextRange) -> Self {
        Self { kind, span }
    }

    /// The token's text, resolved against the full source it was lexed from.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span]
    }
}

/// Line-break handling recorded for the gap before a token.
///
/// The alignment engine never consults or changes this; it is carried so
/// that spacing decisions made by earlier formatting phases survive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpacingDecision {
    /// No decision made yet.
    #[default]
    Undecided,
    /// The token must follow on the same line.
    MustAppend,
    /// The token must start a new line.
    MustWrap,
    /// The original source spacing is kept verbatim.
    Preserve,
}

/// Spacing in front of a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterTokenSpacing {
    /// Number of spaces required before the token. This is the only field
    /// alignment writes to.
    pub spaces_required: usize,
    /// Break handling decided by earlier phases; never touched here.
    pub break_decision: SpacingDecision,
}

/// A token in the pre-format stream, carrying its mutable leading spacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreFormatToken {
    pub token: TokenInfo,
    pub before: InterTokenSpacing,
}

impl PreFormatToken {
    pub fn new(token: TokenInfo) -> Self {
        Self {
            token,
            before: InterTokenSpacing::default(),
        }
    }

    /// Spaces required in front of this token.
    pub fn leading_spaces(&self) -> usize {
        self.before.spaces_required
    }

    /// The token's text, resolved against the full source text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.token.text(source)
    }

    /// Display width of the token text in terminal columns.
    ///
    /// Tokens spanning multiple lines (block comments) are measured by
    /// their total width; callers relying on per-line widths for such
    /// tokens will over-count.
    pub fn width(&self, source: &str) -> usize {
        self.text(source).width()
    }
}
