//! Arena-allocated concrete syntax tree consumed by the alignment engine.
//!
//! The engine does not parse anything itself; the surrounding formatter
//! hands it a tree of nodes (tagged with a raw [`SyntaxKind`]) and leaves
//! (carrying a [`TokenInfo`]). Symbols are stored in one arena vector and
//! referenced by [`SymbolId`], so a partition can point at its originating
//! subtree without lifetimes or back-pointers.
//!
//! Trees are constructed through [`SyntaxTreeBuilder`] with the usual
//! `start_node` / `token` / `finish_node` protocol:
//!
//! ```rust,ignore
//! let mut builder = SyntaxTreeBuilder::new();
//! builder.start_node(SyntaxKind(DECLARATION));
//! builder.token(SyntaxKind(IDENT), span_of("data"));
//! builder.token(SyntaxKind(SEMI), span_of(";"));
//! builder.finish_node();
//! let tree = builder.finish();
//! ```

use std::fmt;

use rowan::{SyntaxKind, TextRange};

use crate::token::TokenInfo;

/// Index of a symbol (node or leaf) in a [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
enum SymbolData {
    Node {
        kind: SyntaxKind,
        children: Vec<SymbolId>,
    },
    Leaf {
        token: TokenInfo,
    },
}

/// An ordered tree of tagged nodes and token leaves.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    symbols: Vec<SymbolData>,
    root: Option<SymbolId>,
}

impl SyntaxTree {
    /// The root symbol, if any node has been built.
    pub fn root(&self) -> Option<SymbolId> {
        self.root
    }

    /// The node kind tag of `symbol`, or `None` if it is a leaf.
    pub fn node_kind(&self, symbol: SymbolId) -> Option<SyntaxKind> {
        match &self.symbols[symbol.index()] {
            SymbolData::Node { kind, .. } => Some(*kind),
            SymbolData::Leaf { .. } => None,
        }
    }

    /// The token carried by `symbol`, or `None` if it is a node.
    pub fn leaf_token(&self, symbol: SymbolId) -> Option<&TokenInfo> {
        match &self.symbols[symbol.index()] {
            SymbolData::Leaf { token } => Some(token),
            SymbolData::Node { .. } => None,
        }
    }

    /// Ordered children of `symbol`; empty for leaves.
    pub fn children(&self, symbol: SymbolId) -> &[SymbolId] {
        match &self.symbols[symbol.index()] {
            SymbolData::Node { children, .. } => children,
            SymbolData::Leaf { .. } => &[],
        }
    }

    /// The first leaf in `symbol`'s subtree, in document order.
    ///
    /// Returns `None` for a node with no leaves anywhere below it, which is
    /// how optional constructs that matched nothing appear.
    pub fn leftmost_leaf(&self, symbol: SymbolId) -> Option<&TokenInfo> {
        match &self.symbols[symbol.index()] {
            SymbolData::Leaf { token } => Some(token),
            SymbolData::Node { children, .. } => {
                children.iter().find_map(|&child| self.leftmost_leaf(child))
            }
        }
    }

    /// The last leaf in `symbol`'s subtree, in document order.
    pub fn rightmost_leaf(&self, symbol: SymbolId) -> Option<&TokenInfo> {
        match &self.symbols[symbol.index()] {
            SymbolData::Leaf { token } => Some(token),
            SymbolData::Node { children, .. } => children
                .iter()
                .rev()
                .find_map(|&child| self.rightmost_leaf(child)),
        }
    }

    /// Byte span of the source text covered by `symbol`'s subtree, from its
    /// leftmost to its rightmost leaf. `None` if the subtree has no leaves.
    pub fn span(&self, symbol: SymbolId) -> Option<TextRange> {
        let first = self.leftmost_leaf(symbol)?;
        let last = self.rightmost_leaf(symbol)?;
        Some(TextRange::new(first.span.start(), last.span.end()))
    }
}

/// Incremental builder for [`SyntaxTree`].
#[derive(Debug, Default)]
pub struct SyntaxTreeBuilder {
    symbols: Vec<SymbolData>,
    stack: Vec<SymbolId>,
    root: Option<SymbolId>,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(data);
        if let Some(&parent) = self.stack.last() {
            match &mut self.symbols[parent.index()] {
                SymbolData::Node { children, .. } => children.push(id),
                SymbolData::Leaf { .. } => unreachable!("leaves are never on the stack"),
            }
        }
        id
    }

    /// Opens a new node tagged with `kind` and returns its id.
    pub fn start_node(&mut self, kind: SyntaxKind) -> SymbolId {
        let id = self.alloc(SymbolData::Node {
            kind,
            children: Vec::new(),
        });
        self.stack.push(id);
        id
    }

    /// Adds a token leaf to the currently open node and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if no node is open.
    pub fn token(&mut self, kind: SyntaxKind, span: TextRange) -> SymbolId {
        assert!(
            !self.stack.is_empty(),
            "token emitted outside of any open node"
        );
        self.alloc(SymbolData::Leaf {
            token: TokenInfo::new(kind, span),
        })
    }

    /// Closes the most recently opened node.
    ///
    /// # Panics
    ///
    /// Panics on unbalanced `finish_node` calls, or if a second top-level
    /// node is closed (trees have a single root).
    pub fn finish_node(&mut self) {
        let id = self
            .stack
            .pop()
            .expect("finish_node called without a matching start_node");
        if self.stack.is_empty() {
            assert!(self.root.is_none(), "syntax tree has more than one root");
            self.root = Some(id);
        }
    }

    /// Finalizes the tree.
    ///
    /// # Panics
    ///
    /// Panics if any node is still open.
    pub fn finish(self) -> SyntaxTree {
        assert!(
            self.stack.is_empty(),
            "finish called with {} unclosed node(s)",
            self.stack.len()
        );
        SyntaxTree {
            symbols: self.symbols,
            root: self.root,
        }
    }
}

/// Position of a symbol in the syntax tree as the sequence of child
/// indices on the path from the root.
///
/// Paths order lexicographically, which gives all alignment points sampled
/// from a tree a total order even when rows mix optional and repeated
/// constructs.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxTreePath(Vec<u32>);

impl SyntaxTreePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Extends the path by one descent step.
    pub fn push(&mut self, child_index: u32) {
        self.0.push(child_index);
    }

    /// Removes the last descent step.
    pub fn pop(&mut self) -> Option<u32> {
        self.0.pop()
    }
}

impl From<Vec<u32>> for SyntaxTreePath {
    fn from(steps: Vec<u32>) -> Self {
        Self(steps)
    }
}

impl From<&[u32]> for SyntaxTreePath {
    fn from(steps: &[u32]) -> Self {
        Self(steps.to_vec())
    }
}

impl fmt::Display for SyntaxTreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{step}")?;
        }
        write!(f, "]")
    }
}
