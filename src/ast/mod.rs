//! AST contract: node-kind taxonomy, attribute record types, trivia, and
//! visitor traversal (spec §3, §4.1, §9 "Deep inheritance of node types").
//!
//! Node kinds are a flat tagged enumeration rather than a class hierarchy.
//! Per-kind data that doesn't belong on every node (an import's qualified
//! name, a type declaration's name) lives in side tables on the
//! [`crate::arena::NodeArena`], keyed by [`crate::arena::NodeIndex`] and
//! typed via the [`Attribute`] trait below. Visitor dispatch is a `match`
//! on `NodeKind`, never virtual dispatch, keeping the arena tight and new
//! node kinds an additive change.

pub mod visitor;

use serde::{Deserialize, Serialize};

/// The flat tag for every node kind the target grammar can produce.
///
/// Scope note: spec.md places the concrete target-language grammar out of
/// bounds for this crate; this taxonomy is the subset of a C-family
/// language's structure that the built-in rules (line length, brace
/// style, indentation, whitespace, import organization) need to hang
/// edits and trivia off of. It is not a complete grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    CompilationUnit,
    PackageDeclaration,
    ImportDeclaration,
    TypeDeclaration,
    FieldDeclaration,
    MethodDeclaration,
    ParameterList,
    Parameter,
    Block,
    Statement,
    ExpressionStatement,
    BinaryExpression,
    Identifier,
    IntegerLiteral,
    StringLiteral,
}

/// Distinguishes the flavor of a [`NodeKind::TypeDeclaration`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

/// Distinguishes the flavor of a [`NodeKind::Statement`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    If,
    While,
    For,
    Return,
    VariableDeclaration,
    Expression,
    Block,
}

/// A leading or trailing comment attached to a node as trivia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub is_line_comment: bool,
}

/// Whitespace, line breaks, and comments attached to a node for
/// round-tripping. Trivia is part of the node record itself (spec §3),
/// not a grammar child and not a typed side-table attribute, since every
/// node kind can carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trivia {
    pub leading_comments: Vec<Comment>,
    pub trailing_comments: Vec<Comment>,
    pub line_break_before: bool,
}

impl Trivia {
    pub fn is_empty(&self) -> bool {
        self.leading_comments.is_empty()
            && self.trailing_comments.is_empty()
            && !self.line_break_before
    }
}

/// Marker trait for typed attribute records attached to arena nodes.
///
/// Each attribute type declares the [`NodeKind`]s it is valid on;
/// [`crate::arena::NodeArena::get_attribute`] enforces this at lookup
/// time, failing with `ArenaError::InvalidArgument` on a mismatch (spec
/// §4.1, testable property §8.2).
pub trait Attribute: 'static + Clone + std::fmt::Debug + Send + Sync {
    /// The node kinds this attribute may be attached to.
    fn allowed_kinds() -> &'static [NodeKind];
}

/// Attribute for [`NodeKind::ImportDeclaration`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportAttribute {
    pub qualified_name: String,
    pub is_wildcard: bool,
    pub is_static: bool,
}

impl Attribute for ImportAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[NodeKind::ImportDeclaration]
    }
}

/// Attribute for [`NodeKind::TypeDeclaration`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclarationAttribute {
    pub type_name: String,
    pub type_kind: TypeKind,
}

impl Attribute for TypeDeclarationAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[NodeKind::TypeDeclaration]
    }
}

/// Attribute for [`NodeKind::PackageDeclaration`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAttribute {
    pub name: String,
}

impl Attribute for PackageAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[NodeKind::PackageDeclaration]
    }
}

/// Attribute for [`NodeKind::MethodDeclaration`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclarationAttribute {
    pub name: String,
    pub return_type: String,
}

impl Attribute for MethodDeclarationAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[NodeKind::MethodDeclaration]
    }
}

/// Attribute for [`NodeKind::FieldDeclaration`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclarationAttribute {
    pub name: String,
    pub declared_type: String,
}

impl Attribute for FieldDeclarationAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[NodeKind::FieldDeclaration]
    }
}

/// Attribute carrying the literal text for identifiers and literals,
/// valid on any leaf token-like node kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAttribute {
    pub text: String,
}

impl Attribute for TextAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[
            NodeKind::Identifier,
            NodeKind::IntegerLiteral,
            NodeKind::StringLiteral,
        ]
    }
}

/// Attribute for [`NodeKind::Statement`] nodes, distinguishing flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementAttribute {
    pub statement_kind: StatementKind,
}

impl Attribute for StatementAttribute {
    fn allowed_kinds() -> &'static [NodeKind] {
        &[NodeKind::Statement]
    }
}
