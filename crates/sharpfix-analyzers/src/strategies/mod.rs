//! Rewrite strategies: what each rule's fix does to one node.
//!
//! A strategy never edits text itself. Given the current tree of a document
//! and a node the engine re-located there, it answers with [`Rewrite`]s in
//! that tree's coordinates, or `None` when the node no longer has the shape
//! the rewrite needs. The engine applies the rewrites and formats the
//! regions marked for it.

pub mod duplicate_call;
pub mod list;
pub mod out_to_return;
pub mod out_to_tuple;
pub mod redundant_convert;
pub mod ref_modifier;

use sharpfix_core::patch::Span;
use sharpfix_cst::{NodeId, SyntaxTree};

use crate::finding::RuleId;
use crate::resolver::RewritePlan;

/// A replacement of `span` in the current text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub span: Span,
    pub text: String,
    /// Normalize whitespace around the written text afterwards.
    pub format: bool,
}

impl Rewrite {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Rewrite {
            span,
            text: text.into(),
            format: false,
        }
    }

    pub fn formatted(span: Span, text: impl Into<String>) -> Self {
        Rewrite {
            span,
            text: text.into(),
            format: true,
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Rewrite::replace(Span::empty(offset), text)
    }

    /// A deletion; the gap it leaves is always formatted.
    pub fn delete(span: Span) -> Self {
        Rewrite::formatted(span, "")
    }
}

pub trait RewriteStrategy: Sync {
    /// Rewrite the node the finding is about.
    fn rewrite_declaration(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>>;

    /// Rewrite one call of the changed method. `arguments` are the argument
    /// positions bound to the plan's parameters.
    fn rewrite_call_site(
        &self,
        _tree: &SyntaxTree,
        _invocation: NodeId,
        _arguments: &[usize],
        _plan: &RewritePlan,
    ) -> Option<Vec<Rewrite>> {
        None
    }
}

pub fn strategy_for(rule: RuleId) -> &'static dyn RewriteStrategy {
    match rule {
        RuleId::RemoveUnnecessaryRef => &ref_modifier::RemoveRefModifier,
        RuleId::ConvertRefToOut => &ref_modifier::ConvertRefToOut,
        RuleId::DuplicateCall => &duplicate_call::MergeDuplicateCall,
        RuleId::RedundantConvert => &redundant_convert::RemoveRedundantConvert,
        RuleId::OutParameterToReturn => &out_to_return::OutParameterToReturn,
        RuleId::OutParametersToTuple => &out_to_tuple::OutParametersToTuple,
    }
}

/// The line break a document predominantly uses.
pub(crate) fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
