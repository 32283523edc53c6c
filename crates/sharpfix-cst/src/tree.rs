// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena-allocated concrete syntax tree.
//!
//! Nodes live in one vector and refer to each other by [`NodeId`]; tokens
//! live in another and are referred to by [`TokenId`]. Every node holds at
//! least one token, and the tokens under a node are a contiguous range of
//! the token vector, so spans come straight from the first and last token.

use serde::Serialize;

use sharpfix_core::patch::Span;

use crate::kind::SyntaxKind;
use crate::tokenizer::{render_tokens, Token};

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a token in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TokenId(pub u32);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A child of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Node(NodeId),
    Token(TokenId),
}

impl Element {
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            Element::Node(id) => Some(id),
            Element::Token(_) => None,
        }
    }

    pub fn as_token(self) -> Option<TokenId> {
        match self {
            Element::Token(id) => Some(id),
            Element::Node(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    parent: Option<NodeId>,
    children: Vec<Element>,
    first: u32,
    last: u32,
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    tokens: Vec<Token>,
    token_parent: Vec<NodeId>,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    pub fn kind(&self, node: NodeId) -> SyntaxKind {
        self.nodes[node.index()].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn token_parent(&self, token: TokenId) -> NodeId {
        self.token_parent[token.index()]
    }

    pub fn children(&self, node: NodeId) -> &[Element] {
        &self.nodes[node.index()].children
    }

    pub fn child_nodes(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node).iter().filter_map(|e| e.as_node())
    }

    pub fn child_tokens(&self, node: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        self.children(node).iter().filter_map(|e| e.as_token())
    }

    pub fn child_of_kind(&self, node: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.child_nodes(node).find(|&c| self.kind(c) == kind)
    }

    pub fn children_of_kind(
        &self,
        node: NodeId,
        kind: SyntaxKind,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.child_nodes(node).filter(move |&c| self.kind(c) == kind)
    }

    /// First direct token child with the given text.
    pub fn child_token(&self, node: NodeId, text: &str) -> Option<TokenId> {
        self.child_tokens(node).find(|&t| self.token(t).text == text)
    }

    pub fn first_token(&self, node: NodeId) -> TokenId {
        TokenId(self.nodes[node.index()].first)
    }

    pub fn last_token(&self, node: NodeId) -> TokenId {
        TokenId(self.nodes[node.index()].last)
    }

    /// All tokens under a node, in source order.
    pub fn token_ids(&self, node: NodeId) -> impl Iterator<Item = TokenId> {
        let data = &self.nodes[node.index()];
        (data.first..=data.last).map(TokenId)
    }

    pub fn next_token(&self, token: TokenId) -> Option<TokenId> {
        let next = token.0 + 1;
        ((next as usize) < self.tokens.len()).then_some(TokenId(next))
    }

    pub fn prev_token(&self, token: TokenId) -> Option<TokenId> {
        token.0.checked_sub(1).map(TokenId)
    }

    /// Span of the node text, excluding the outer trivia.
    pub fn span(&self, node: NodeId) -> Span {
        let first = self.token(self.first_token(node));
        let last = self.token(self.last_token(node));
        Span::new(first.offset, last.end())
    }

    /// Span including the first token's leading and the last token's
    /// trailing trivia.
    pub fn full_span(&self, node: NodeId) -> Span {
        let first = self.token(self.first_token(node));
        let last = self.token(self.last_token(node));
        Span::new(first.full_start(), last.full_end())
    }

    pub fn text(&self, node: NodeId) -> &str {
        let span = self.span(node);
        &self.source[span.start..span.end]
    }

    pub fn full_text(&self, node: NodeId) -> &str {
        let span = self.full_span(node);
        &self.source[span.start..span.end]
    }

    /// Source text covered by a span.
    pub fn slice(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }

    /// Parents of `node`, nearest first. Does not include `node` itself.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    /// Nearest ancestor of the given kind.
    pub fn ancestor_of_kind(&self, node: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.ancestors(node).find(|&n| self.kind(n) == kind)
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Nodes under `node` in pre-order. Does not include `node` itself.
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.child_nodes(node).collect();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Token whose full span contains `offset`.
    ///
    /// An offset that falls exactly between two tokens belongs to the later
    /// one.
    pub fn token_at_offset(&self, offset: usize) -> Option<TokenId> {
        if offset > self.source.len() {
            return None;
        }
        let idx = self
            .tokens
            .partition_point(|t| t.full_start() <= offset)
            .checked_sub(1)?;
        Some(TokenId(idx as u32))
    }

    /// Deepest node whose span contains `span`.
    pub fn covering_node(&self, span: Span) -> NodeId {
        let mut current = self.root();
        'descend: loop {
            for child in self.child_nodes(current) {
                if self.span(child).contains(&span) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Deepest node of `kind` whose span equals `span`.
    pub fn find_node(&self, kind: SyntaxKind, span: Span) -> Option<NodeId> {
        let covering = self.covering_node(span);
        std::iter::once(covering)
            .chain(self.ancestors(covering))
            .find(|&n| self.kind(n) == kind && self.span(n) == span)
    }

    /// Nodes of `kind` whose first token starts at `offset`, innermost first.
    ///
    /// Unlike [`SyntaxTree::find_node`] this ignores where a node ends, so a
    /// node can be found again after text inside it was rewritten. The
    /// position in the returned list tells nested nodes apart, as in
    /// `M(a).N(b)` where both invocations start at `M`.
    pub fn nodes_starting_at(&self, kind: SyntaxKind, offset: usize) -> Vec<NodeId> {
        let Some(token) = self.token_at_offset(offset) else {
            return Vec::new();
        };
        if self.token(token).offset != offset {
            return Vec::new();
        }
        let parent = self.token_parent(token);
        std::iter::once(parent)
            .chain(self.ancestors(parent))
            .take_while(|&n| self.first_token(n) == token)
            .filter(|&n| self.kind(n) == kind)
            .collect()
    }

    /// Regenerate the source from the tokens and their trivia.
    pub fn codegen(&self) -> String {
        render_tokens(&self.tokens)
    }
}

/// Pre-order iterator returned by [`SyntaxTree::descendants`].
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.tree.child_nodes(node));
        self.stack[start..].reverse();
        Some(node)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Position in the currently open node, used to wrap already-built children.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint(usize);

/// Incremental construction of a [`SyntaxTree`] by the parser.
pub(crate) struct TreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
    token_parent: Vec<NodeId>,
}

impl TreeBuilder {
    pub(crate) fn new(token_count: usize) -> Self {
        TreeBuilder {
            nodes: Vec::new(),
            open: Vec::new(),
            token_parent: vec![NodeId(0); token_count],
        }
    }

    fn alloc(&mut self, kind: SyntaxKind, children: Vec<Element>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: self.open.last().copied(),
            children,
            first: 0,
            last: 0,
        });
        id
    }

    pub(crate) fn start_node(&mut self, kind: SyntaxKind) {
        let id = self.alloc(kind, Vec::new());
        if let Some(&parent) = self.open.last() {
            self.nodes[parent.index()].children.push(Element::Node(id));
        }
        self.open.push(id);
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        let len = self
            .open
            .last()
            .map(|p| self.nodes[p.index()].children.len())
            .unwrap_or(0);
        Checkpoint(len)
    }

    /// Open a node that adopts every child added since `checkpoint`.
    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        let Some(&parent) = self.open.last() else {
            self.start_node(kind);
            return;
        };
        let moved = self.nodes[parent.index()].children.split_off(checkpoint.0);
        let id = self.alloc(kind, moved);
        self.nodes[parent.index()].children.push(Element::Node(id));
        self.open.push(id);
    }

    pub(crate) fn token(&mut self, token: usize) {
        if let Some(&parent) = self.open.last() {
            self.nodes[parent.index()]
                .children
                .push(Element::Token(TokenId(token as u32)));
        }
    }

    pub(crate) fn finish_node(&mut self) {
        let Some(id) = self.open.pop() else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.index()].children);
        let mut first = None;
        let mut last = 0;
        for child in &children {
            let (lo, hi) = match *child {
                Element::Token(t) => {
                    self.token_parent[t.index()] = id;
                    (t.0, t.0)
                }
                Element::Node(n) => {
                    let data = &mut self.nodes[n.index()];
                    data.parent = Some(id);
                    (data.first, data.last)
                }
            };
            first.get_or_insert(lo);
            last = hi;
        }
        let data = &mut self.nodes[id.index()];
        data.first = first.unwrap_or(last);
        data.last = last;
        data.children = children;
    }

    pub(crate) fn finish(mut self, source: String, tokens: Vec<Token>) -> SyntaxTree {
        while !self.open.is_empty() {
            self.finish_node();
        }
        SyntaxTree {
            source,
            tokens,
            token_parent: self.token_parent,
            nodes: self.nodes,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
