//! The semantic model the detectors and the rewrite engine consume.
//!
//! Everything above this module talks to a program only through the
//! [`SemanticModel`] trait: which method a declaration declares, what an
//! expression refers to, where a method is referenced, and how values flow
//! through a block. [`ProgramModel`] is the implementation for the C# subset
//! the parser understands; it is built once per solution snapshot and is
//! read-only afterwards, so detectors can share it across threads.

pub mod binder;
pub mod dataflow;
pub mod interpolation;
pub mod library;
pub mod program;
pub mod references;
pub mod symbols;
pub mod types;

use std::collections::BTreeSet;

use sharpfix_core::patch::Span;
use sharpfix_cst::NodeId;
use tokio_util::sync::CancellationToken;

use crate::error::AnalyzerResult;
use crate::workspace::{DocumentId, Solution};

pub use program::ProgramModel;
pub use symbols::{
    Accessibility, MethodId, MethodSymbol, ParameterSymbol, PassMode, Symbol, TypeId, TypeKind,
    TypeSymbol, VariableId, VariableKind, VariableSymbol,
};
pub use types::{Primitive, Type};

/// Result of analyzing how values flow through a block.
///
/// When `succeeded` is false the sets are empty and callers abstain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFlowAnalysis {
    pub succeeded: bool,
    /// Variables written anywhere in the block.
    pub written_inside: BTreeSet<VariableId>,
    /// Variables definitely assigned on every normal exit of the block.
    pub always_assigned: BTreeSet<VariableId>,
    /// Variables declared outside the block whose incoming value is read.
    pub data_flows_in: BTreeSet<VariableId>,
}

impl DataFlowAnalysis {
    pub fn failed() -> Self {
        DataFlowAnalysis::default()
    }
}

/// Syntactic role of a reference to a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceRole {
    /// The name being called in an invocation.
    InvocationCallee,
    /// Any other use: a method group, a name inside an interpolated string.
    Other,
    /// A call with the method's name and a fitting argument count that the
    /// model could not bind to any method. It may be a call of this method.
    Unresolved,
}

/// One occurrence of a method name that resolves to a given method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolReference {
    pub document: DocumentId,
    /// Span of the method name token.
    pub span: Span,
    pub role: ReferenceRole,
    /// The enclosing invocation when `role` is `InvocationCallee` or
    /// `Unresolved`.
    pub invocation: Option<NodeId>,
}

/// Read-only questions about one solution snapshot.
///
/// Node ids are only meaningful for the snapshot the model was built from.
pub trait SemanticModel: Sync {
    /// The snapshot this model describes.
    fn solution(&self) -> &Solution;

    fn method(&self, id: MethodId) -> Option<&MethodSymbol>;

    fn type_symbol(&self, id: TypeId) -> Option<&TypeSymbol>;

    /// The method a `MethodDeclaration` node declares.
    fn declared_method(&self, document: DocumentId, declaration: NodeId) -> Option<&MethodSymbol>;

    /// What an expression refers to. Invocations and their callees refer to
    /// the method the call resolves to.
    fn referenced_symbol(&self, document: DocumentId, expression: NodeId) -> Option<Symbol>;

    /// Static type of an expression, [`Type::Unknown`] when it cannot be
    /// determined.
    fn type_of(&self, document: DocumentId, expression: NodeId) -> Type;

    /// True for explicit interface implementations and for methods that
    /// implicitly implement a member of an interface the containing type
    /// inherits.
    fn implements_interface(&self, method: MethodId) -> bool;

    /// Every reference to `method` across the solution, ordered by document
    /// and offset. The declaration itself is not a reference. Calls that
    /// might be references but could not be bound are included with
    /// [`ReferenceRole::Unresolved`].
    fn find_all_references(
        &self,
        method: MethodId,
        cancel: &CancellationToken,
    ) -> AnalyzerResult<Vec<SymbolReference>>;

    /// Definite assignment and data flow over a block.
    fn analyze_data_flow(&self, document: DocumentId, block: NodeId) -> DataFlowAnalysis;
}
