//! Tatami Core
//!
//! Tabular alignment engine for source-code formatters. Given a stream of
//! pre-formatted tokens partitioned into line-shaped rows, the engine
//! adjusts the leading whitespace of selected tokens so that
//! syntactically-corresponding columns line up vertically across adjacent
//! rows, such as the `=` of a run of assignments or the names in a
//! declaration list.
//!
//! The engine is deliberately language-agnostic: lexing, parsing,
//! partitioning, and rendering belong to the surrounding formatter, and the
//! decision of *which* tokens start columns is supplied per language as a
//! scanner function. See [`align::tabular_align_tokens`] for the entry
//! point and [`align`] for the pipeline description.

pub mod align;
pub mod config;
pub mod interval_set;
pub mod partition;
pub mod syntax;
pub mod token;

// Span and kind currency used throughout the crate.
pub use rowan::{SyntaxKind, TextRange, TextSize};

pub use align::{
    AbandonReason, AlignmentColumnProperties, ColumnPositionEntry, ColumnSchemaScanner,
    tabular_align_tokens,
};
pub use config::AlignmentConfig;
pub use interval_set::{ByteOffsetSet, IntervalSet};
pub use partition::{TokenPartitionTree, UnwrappedLine};
pub use syntax::{SymbolId, SyntaxTree, SyntaxTreeBuilder, SyntaxTreePath};
pub use token::{InterTokenSpacing, PreFormatToken, SpacingDecision, TokenInfo, TokenRange};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tatami=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
