//! Symbols: declared methods, types, members and variables.

use sharpfix_core::patch::Span;
use sharpfix_cst::NodeId;

use crate::semantic::types::Type;
use crate::workspace::DocumentId;

/// Identity of a method across the whole program. Two methods with the same
/// name but different signatures always have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Identity of a parameter or local: the document and the offset of the
/// identifier that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    pub document: DocumentId,
    pub offset: usize,
}

/// How an argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassMode {
    Value,
    Ref,
    Out,
    In,
}

impl PassMode {
    pub fn from_keyword(keyword: &str) -> Option<PassMode> {
        match keyword {
            "ref" => Some(PassMode::Ref),
            "out" => Some(PassMode::Out),
            "in" => Some(PassMode::In),
            _ => None,
        }
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            PassMode::Value => None,
            PassMode::Ref => Some("ref"),
            PassMode::Out => Some("out"),
            PassMode::In => Some("in"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSymbol {
    pub name: String,
    pub ty: Type,
    pub mode: PassMode,
    pub is_params: bool,
    pub has_default: bool,
    /// All modifier keywords, `this` and `scoped` included.
    pub modifier_count: usize,
    pub has_attributes: bool,
    /// `None` for library methods.
    pub variable: Option<VariableId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    PrivateProtected,
    Private,
    /// Explicit interface implementations.
    NotApplicable,
}

impl Accessibility {
    /// Accessibility written with `modifiers`, or `default` if none is.
    pub fn from_modifiers<'a>(
        modifiers: impl IntoIterator<Item = &'a str>,
        default: Accessibility,
    ) -> Accessibility {
        let mut public = false;
        let mut internal = false;
        let mut protected = false;
        let mut private = false;
        for m in modifiers {
            match m {
                "public" => public = true,
                "internal" => internal = true,
                "protected" => protected = true,
                "private" => private = true,
                _ => {}
            }
        }
        match (public, internal, protected, private) {
            (true, ..) => Accessibility::Public,
            (_, true, true, _) => Accessibility::ProtectedInternal,
            (_, _, true, true) => Accessibility::PrivateProtected,
            (_, true, ..) => Accessibility::Internal,
            (_, _, true, _) => Accessibility::Protected,
            (_, _, _, true) => Accessibility::Private,
            _ => default,
        }
    }
}

/// Where a method is declared in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub document: DocumentId,
    pub node: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodModifiers {
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_abstract: bool,
    pub is_extern: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSymbol {
    pub id: MethodId,
    pub name: String,
    pub containing_type: TypeId,
    pub parameters: Vec<ParameterSymbol>,
    pub return_type: Type,
    pub type_parameter_count: usize,
    pub modifiers: MethodModifiers,
    pub accessibility: Accessibility,
    /// `IFoo` in `void IFoo.M()`.
    pub explicit_interface: Option<String>,
    pub has_body: bool,
    /// `None` for library methods.
    pub declaration: Option<Declaration>,
}

impl MethodSymbol {
    pub fn is_explicit_interface_implementation(&self) -> bool {
        self.explicit_interface.is_some()
    }

    /// Parameter types and pass modes, the part of a signature interface
    /// matching compares.
    pub fn signature(&self) -> Vec<(&Type, PassMode)> {
        self.parameters.iter().map(|p| (&p.ty, p.mode)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Record,
}

/// A field or property.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSymbol {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSymbol {
    pub id: TypeId,
    pub name: String,
    /// Namespace and enclosing types included, e.g. `App.Outer.Inner`.
    pub qualified_name: String,
    pub kind: TypeKind,
    pub bases: Vec<TypeId>,
    pub methods: Vec<MethodId>,
    pub members: Vec<MemberSymbol>,
    /// Every declaration; partial types have several.
    pub declarations: Vec<(DocumentId, NodeId)>,
}

impl TypeSymbol {
    pub fn member(&self, name: &str) -> Option<&MemberSymbol> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Parameter,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub id: VariableId,
    pub name: String,
    pub ty: Type,
    pub kind: VariableKind,
}

/// What a name or expression refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Method(MethodId),
    Type(TypeId),
    Variable(VariableSymbol),
    Member { owner: TypeId, member: MemberSymbol },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessibility_from_modifiers() {
        let default = Accessibility::Private;
        assert_eq!(
            Accessibility::from_modifiers(["public", "static"], default),
            Accessibility::Public
        );
        assert_eq!(
            Accessibility::from_modifiers(["protected", "internal"], default),
            Accessibility::ProtectedInternal
        );
        assert_eq!(
            Accessibility::from_modifiers(["private", "protected"], default),
            Accessibility::PrivateProtected
        );
        assert_eq!(Accessibility::from_modifiers(["static"], default), default);
        assert_eq!(
            Accessibility::from_modifiers(Vec::<&str>::new(), Accessibility::Public),
            Accessibility::Public
        );
    }

    #[test]
    fn pass_mode_keywords() {
        assert_eq!(PassMode::from_keyword("ref"), Some(PassMode::Ref));
        assert_eq!(PassMode::from_keyword("params"), None);
        assert_eq!(PassMode::Out.keyword(), Some("out"));
        assert_eq!(PassMode::Value.keyword(), None);
    }
}
