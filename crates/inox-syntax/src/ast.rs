//! AST node definitions for Inox.
//!
//! Every syntactic construct is a [`Node`]: an identity, a span and a
//! [`NodeKind`]. Node identities are unique across the whole process so
//! analysis tables built for different chunks never collide.
//!
//! Names in binding positions (declared variables, parameters, property
//! keys) are plain [`Name`]s rather than nodes: they are never visited as
//! references.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use inox_common::Span;

/// Process-unique identity of a node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

impl NodeId {
    /// Allocates a new identity.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An identifier in a binding position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

impl Name {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

/// The key of an object, record or object pattern property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropKey {
    pub name: String,
    pub span: Span,
    /// The key was written as a string literal.
    pub quoted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Range,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Range => "..",
        }
    }
}

/// A syntax tree node.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            id: NodeId::fresh(),
            span,
            kind,
        }
    }

    /// Returns a stable lowercase name of the node's kind, used in messages.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// All node kinds.
#[derive(Debug)]
pub enum NodeKind {
    // ═══════════════════════════════════════════════════════════════════════
    // Modules
    // ═══════════════════════════════════════════════════════════════════════
    Chunk {
        manifest: Option<Box<Node>>,
        /// The chunk starts with `includable-file`.
        includable: bool,
        statements: Vec<Node>,
    },
    /// A module nested in another one (`go do {}`, test suites and cases).
    EmbeddedModule {
        manifest: Option<Box<Node>>,
        statements: Vec<Node>,
        /// Written as `go do f()`: the module body is a single call.
        single_call_expr: bool,
    },
    Manifest {
        object: Box<Node>,
    },
    /// `import ./file.ix`
    InclusionImport {
        source: Box<Node>,
    },
    /// `import name <source> {config}`
    Import {
        identifier: Name,
        source: Box<Node>,
        config: Box<Node>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════════
    GlobalConstDecls {
        decls: Vec<Node>,
    },
    GlobalConstDecl {
        name: Name,
        value: Box<Node>,
    },
    LocalVarDecls {
        decls: Vec<Node>,
    },
    LocalVarDecl {
        name: Name,
        ty: Option<Box<Node>>,
        value: Option<Box<Node>>,
    },
    GlobalVarDecls {
        decls: Vec<Node>,
    },
    GlobalVarDecl {
        name: Name,
        ty: Option<Box<Node>>,
        value: Option<Box<Node>>,
    },
    Assignment {
        left: Box<Node>,
        op: AssignOp,
        right: Box<Node>,
    },
    /// `assign a b = <expr>`
    MultiAssignment {
        vars: Vec<Name>,
        right: Box<Node>,
    },
    FnDecl {
        name: Name,
        function: Box<Node>,
    },
    StructDef {
        name: Name,
        body: Vec<Node>,
    },
    StructField {
        name: Name,
        ty: Box<Node>,
    },
    PatternDef {
        name: Name,
        value: Box<Node>,
        lazy: bool,
    },
    PatternNsDef {
        name: Name,
        value: Box<Node>,
    },
    Extend {
        pattern: Box<Node>,
        extension: Box<Node>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Control flow
    // ═══════════════════════════════════════════════════════════════════════
    Block {
        statements: Vec<Node>,
    },
    If {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    For {
        key: Option<Name>,
        value: Option<Name>,
        iterated: Box<Node>,
        body: Box<Node>,
    },
    ForExpr {
        key: Option<Name>,
        value: Option<Name>,
        iterated: Box<Node>,
        body: Box<Node>,
    },
    Walk {
        walked: Box<Node>,
        meta: Option<Name>,
        entry: Option<Name>,
        body: Box<Node>,
    },
    WalkExpr {
        walked: Box<Node>,
        meta: Option<Name>,
        entry: Option<Name>,
        body: Box<Node>,
    },
    Switch {
        discriminant: Box<Node>,
        cases: Vec<Node>,
        default: Option<Box<Node>>,
    },
    SwitchCase {
        values: Vec<Node>,
        block: Box<Node>,
    },
    DefaultCase {
        block: Box<Node>,
    },
    Match {
        discriminant: Box<Node>,
        cases: Vec<Node>,
        default: Option<Box<Node>>,
    },
    MatchCase {
        values: Vec<Node>,
        group_var: Option<Name>,
        block: Box<Node>,
    },
    Break,
    Continue,
    Prune,
    Yield(Option<Box<Node>>),
    Return(Option<Box<Node>>),
    Coyield(Option<Box<Node>>),

    // ═══════════════════════════════════════════════════════════════════════
    // Names
    // ═══════════════════════════════════════════════════════════════════════
    Variable(String),
    GlobalVariable(String),
    Ident(String),
    SelfExpr,

    // ═══════════════════════════════════════════════════════════════════════
    // Simple literals
    // ═══════════════════════════════════════════════════════════════════════
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    Quantity {
        values: Vec<f64>,
        units: Vec<String>,
    },
    Rate {
        values: Vec<f64>,
        units: Vec<String>,
        div_unit: String,
    },
    IntRange {
        lower: Box<Node>,
        upper: Option<Box<Node>>,
    },
    FloatRange {
        lower: Box<Node>,
        upper: Option<Box<Node>>,
    },
    AbsPath(String),
    RelPath(String),
    Url(String),
    Host(String),

    // ═══════════════════════════════════════════════════════════════════════
    // Operators and access
    // ═══════════════════════════════════════════════════════════════════════
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Member {
        left: Box<Node>,
        property: Name,
    },
    Index {
        indexed: Box<Node>,
        index: Box<Node>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Collections
    // ═══════════════════════════════════════════════════════════════════════
    List {
        elements: Vec<Node>,
    },
    Object {
        properties: Vec<Node>,
        /// `_name_ { ... }` entries.
        meta_properties: Vec<Node>,
    },
    /// A metaproperty of an object literal, initialized by a block.
    MetaProperty {
        key: Name,
        init: Box<Node>,
    },
    InitializationBlock {
        statements: Vec<Node>,
    },
    /// A property without key is an element with an implicit index key.
    ObjectProperty {
        key: Option<PropKey>,
        value: Box<Node>,
    },
    PropertySpread {
        expr: Box<Node>,
    },
    Record {
        properties: Vec<Node>,
    },
    Dictionary {
        entries: Vec<Node>,
    },
    DictEntry {
        key: Box<Node>,
        value: Box<Node>,
    },
    KeyList {
        keys: Vec<Name>,
    },
    Mapping {
        entries: Vec<Node>,
    },
    StaticMappingEntry {
        key: Box<Node>,
        value: Box<Node>,
    },
    DynamicMappingEntry {
        key: Box<Node>,
        key_var: Name,
        group_var: Option<Name>,
        value: Box<Node>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════════
    /// `comp <expr>`
    Compute {
        expr: Box<Node>,
    },
    FnExpr {
        captures: Vec<Name>,
        params: Vec<Node>,
        return_type: Option<Box<Node>>,
        body: Box<Node>,
    },
    Param {
        name: Name,
        ty: Option<Box<Node>>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Patterns and types
    // ═══════════════════════════════════════════════════════════════════════
    /// `%name`, or a bare name in a type position.
    PatternIdent {
        name: String,
        unprefixed: bool,
    },
    PatternNsIdent(String),
    PatternNsMember {
        namespace: Name,
        member: Name,
    },
    ObjectPattern {
        properties: Vec<Node>,
    },
    ObjectPatternProperty {
        key: PropKey,
        value: Box<Node>,
    },
    PointerType {
        value: Box<Node>,
    },
    Readonly {
        pattern: Box<Node>,
    },
    /// `~<expr>`
    RuntimeTypeCheck {
        expr: Box<Node>,
    },
    New {
        ty: Box<Node>,
        init: Option<Box<Node>>,
    },
    StructInit {
        fields: Vec<Node>,
    },
    StructFieldInit {
        name: Name,
        value: Box<Node>,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Concurrency and testing
    // ═══════════════════════════════════════════════════════════════════════
    Spawn {
        meta: Option<Box<Node>>,
        module: Box<Node>,
    },
    /// `on received <pattern> <handler>` inside an object literal.
    ReceptionHandler {
        pattern: Box<Node>,
        handler: Box<Node>,
    },
    SendValue {
        value: Box<Node>,
        receiver: Box<Node>,
    },
    TestSuite {
        meta: Option<Box<Node>>,
        module: Box<Node>,
        is_statement: bool,
    },
    TestCase {
        meta: Option<Box<Node>>,
        module: Box<Node>,
        is_statement: bool,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Special
    // ═══════════════════════════════════════════════════════════════════════
    /// Placeholder for a construct that failed to parse.
    Invalid,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Chunk { .. } => "chunk",
            NodeKind::EmbeddedModule { .. } => "embedded module",
            NodeKind::Manifest { .. } => "manifest",
            NodeKind::InclusionImport { .. } => "inclusion import",
            NodeKind::Import { .. } => "import",
            NodeKind::GlobalConstDecls { .. } => "global constant declarations",
            NodeKind::GlobalConstDecl { .. } => "global constant declaration",
            NodeKind::LocalVarDecls { .. } => "local variable declarations",
            NodeKind::LocalVarDecl { .. } => "local variable declaration",
            NodeKind::GlobalVarDecls { .. } => "global variable declarations",
            NodeKind::GlobalVarDecl { .. } => "global variable declaration",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::MultiAssignment { .. } => "multi assignment",
            NodeKind::FnDecl { .. } => "function declaration",
            NodeKind::StructDef { .. } => "struct definition",
            NodeKind::StructField { .. } => "struct field",
            NodeKind::PatternDef { .. } => "pattern definition",
            NodeKind::PatternNsDef { .. } => "pattern namespace definition",
            NodeKind::Extend { .. } => "extend statement",
            NodeKind::Block { .. } => "block",
            NodeKind::If { .. } => "if statement",
            NodeKind::For { .. } => "for statement",
            NodeKind::ForExpr { .. } => "for expression",
            NodeKind::Walk { .. } => "walk statement",
            NodeKind::WalkExpr { .. } => "walk expression",
            NodeKind::Switch { .. } => "switch statement",
            NodeKind::SwitchCase { .. } => "switch case",
            NodeKind::DefaultCase { .. } => "default case",
            NodeKind::Match { .. } => "match statement",
            NodeKind::MatchCase { .. } => "match case",
            NodeKind::Break => "break statement",
            NodeKind::Continue => "continue statement",
            NodeKind::Prune => "prune statement",
            NodeKind::Yield(_) => "yield statement",
            NodeKind::Return(_) => "return statement",
            NodeKind::Coyield(_) => "coyield statement",
            NodeKind::Variable(_) => "variable",
            NodeKind::GlobalVariable(_) => "global variable",
            NodeKind::Ident(_) => "identifier",
            NodeKind::SelfExpr => "self expression",
            NodeKind::Int(_) => "integer literal",
            NodeKind::Float(_) => "float literal",
            NodeKind::Str(_) => "string literal",
            NodeKind::Bool(_) => "boolean literal",
            NodeKind::Nil => "nil literal",
            NodeKind::Quantity { .. } => "quantity literal",
            NodeKind::Rate { .. } => "rate literal",
            NodeKind::IntRange { .. } => "integer range literal",
            NodeKind::FloatRange { .. } => "float range literal",
            NodeKind::AbsPath(_) => "absolute path literal",
            NodeKind::RelPath(_) => "relative path literal",
            NodeKind::Url(_) => "url literal",
            NodeKind::Host(_) => "host literal",
            NodeKind::Unary { .. } => "unary expression",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::Call { .. } => "call expression",
            NodeKind::Member { .. } => "member expression",
            NodeKind::Index { .. } => "index expression",
            NodeKind::List { .. } => "list literal",
            NodeKind::Object { .. } => "object literal",
            NodeKind::MetaProperty { .. } => "object metaproperty",
            NodeKind::InitializationBlock { .. } => "initialization block",
            NodeKind::ObjectProperty { .. } => "object property",
            NodeKind::PropertySpread { .. } => "property spread",
            NodeKind::Record { .. } => "record literal",
            NodeKind::Dictionary { .. } => "dictionary literal",
            NodeKind::DictEntry { .. } => "dictionary entry",
            NodeKind::KeyList { .. } => "key list expression",
            NodeKind::Mapping { .. } => "mapping expression",
            NodeKind::StaticMappingEntry { .. } => "static mapping entry",
            NodeKind::DynamicMappingEntry { .. } => "dynamic mapping entry",
            NodeKind::Compute { .. } => "compute expression",
            NodeKind::FnExpr { .. } => "function expression",
            NodeKind::Param { .. } => "parameter",
            NodeKind::PatternIdent { .. } => "pattern identifier",
            NodeKind::PatternNsIdent(_) => "pattern namespace identifier",
            NodeKind::PatternNsMember { .. } => "pattern namespace member",
            NodeKind::ObjectPattern { .. } => "object pattern literal",
            NodeKind::ObjectPatternProperty { .. } => "object pattern property",
            NodeKind::PointerType { .. } => "pointer type",
            NodeKind::Readonly { .. } => "readonly pattern expression",
            NodeKind::RuntimeTypeCheck { .. } => "runtime type check expression",
            NodeKind::New { .. } => "new expression",
            NodeKind::StructInit { .. } => "struct initialization literal",
            NodeKind::StructFieldInit { .. } => "struct field initialization",
            NodeKind::Spawn { .. } => "spawn expression",
            NodeKind::ReceptionHandler { .. } => "reception handler",
            NodeKind::SendValue { .. } => "sendval expression",
            NodeKind::TestSuite { .. } => "test suite",
            NodeKind::TestCase { .. } => "test case",
            NodeKind::Invalid => "invalid node",
        }
    }

    /// Chunks and embedded modules are scope roots for globals.
    pub fn is_module_root(&self) -> bool {
        matches!(self, NodeKind::Chunk { .. } | NodeKind::EmbeddedModule { .. })
    }

    /// Nodes that own a local variable scope.
    pub fn is_scope_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Chunk { .. }
                | NodeKind::EmbeddedModule { .. }
                | NodeKind::FnExpr { .. }
                | NodeKind::Mapping { .. }
                | NodeKind::StaticMappingEntry { .. }
                | NodeKind::DynamicMappingEntry { .. }
                | NodeKind::TestSuite { .. }
                | NodeKind::TestCase { .. }
                | NodeKind::Extend { .. }
                | NodeKind::StructDef { .. }
                | NodeKind::InitializationBlock { .. }
        )
    }

    /// Literals whose value is known without evaluation.
    pub fn is_simple_value_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::Int(_)
                | NodeKind::Float(_)
                | NodeKind::Str(_)
                | NodeKind::Bool(_)
                | NodeKind::Nil
                | NodeKind::Quantity { .. }
                | NodeKind::Rate { .. }
                | NodeKind::IntRange { .. }
                | NodeKind::FloatRange { .. }
                | NodeKind::AbsPath(_)
                | NodeKind::RelPath(_)
                | NodeKind::Url(_)
                | NodeKind::Host(_)
        )
    }
}

impl Node {
    /// The direct children of this node in source order.
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::Chunk {
                manifest,
                statements,
                ..
            }
            | NodeKind::EmbeddedModule {
                manifest,
                statements,
                ..
            } => {
                out.extend(manifest.as_deref());
                out.extend(statements.iter());
            }
            NodeKind::Manifest { object } => out.push(object),
            NodeKind::InclusionImport { source } => out.push(source),
            NodeKind::Import { source, config, .. } => {
                out.push(source);
                out.push(config);
            }
            NodeKind::GlobalConstDecls { decls }
            | NodeKind::LocalVarDecls { decls }
            | NodeKind::GlobalVarDecls { decls } => out.extend(decls.iter()),
            NodeKind::GlobalConstDecl { value, .. } => out.push(value),
            NodeKind::LocalVarDecl { ty, value, .. } | NodeKind::GlobalVarDecl { ty, value, .. } => {
                out.extend(ty.as_deref());
                out.extend(value.as_deref());
            }
            NodeKind::Assignment { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::MultiAssignment { right, .. } => out.push(right),
            NodeKind::FnDecl { function, .. } => out.push(function),
            NodeKind::StructDef { body, .. } => out.extend(body.iter()),
            NodeKind::StructField { ty, .. } => out.push(ty),
            NodeKind::PatternDef { value, .. } | NodeKind::PatternNsDef { value, .. } => out.push(value),
            NodeKind::Extend { pattern, extension } => {
                out.push(pattern);
                out.push(extension);
            }
            NodeKind::Block { statements } => out.extend(statements.iter()),
            NodeKind::If {
                test,
                consequent,
                alternate,
            } => {
                out.push(test);
                out.push(consequent);
                out.extend(alternate.as_deref());
            }
            NodeKind::For { iterated, body, .. } | NodeKind::ForExpr { iterated, body, .. } => {
                out.push(iterated);
                out.push(body);
            }
            NodeKind::Walk { walked, body, .. } | NodeKind::WalkExpr { walked, body, .. } => {
                out.push(walked);
                out.push(body);
            }
            NodeKind::Switch {
                discriminant,
                cases,
                default,
            }
            | NodeKind::Match {
                discriminant,
                cases,
                default,
            } => {
                out.push(discriminant);
                out.extend(cases.iter());
                out.extend(default.as_deref());
            }
            NodeKind::SwitchCase { values, block } | NodeKind::MatchCase { values, block, .. } => {
                out.extend(values.iter());
                out.push(block);
            }
            NodeKind::DefaultCase { block } => out.push(block),
            NodeKind::Yield(value) | NodeKind::Return(value) | NodeKind::Coyield(value) => {
                out.extend(value.as_deref());
            }
            NodeKind::IntRange { lower, upper } | NodeKind::FloatRange { lower, upper } => {
                out.push(lower);
                out.extend(upper.as_deref());
            }
            NodeKind::Unary { operand, .. } => out.push(operand),
            NodeKind::Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Call { callee, args } => {
                out.push(callee);
                out.extend(args.iter());
            }
            NodeKind::Member { left, .. } => out.push(left),
            NodeKind::Index { indexed, index } => {
                out.push(indexed);
                out.push(index);
            }
            NodeKind::List { elements } => out.extend(elements.iter()),
            NodeKind::Object {
                properties,
                meta_properties,
            } => {
                out.extend(properties.iter());
                out.extend(meta_properties.iter());
            }
            NodeKind::Record { properties } | NodeKind::ObjectPattern { properties } => out.extend(properties.iter()),
            NodeKind::MetaProperty { init, .. } => out.push(init),
            NodeKind::InitializationBlock { statements } => out.extend(statements.iter()),
            NodeKind::ObjectProperty { value, .. } | NodeKind::ObjectPatternProperty { value, .. } => {
                out.push(value)
            }
            NodeKind::PropertySpread { expr }
            | NodeKind::Compute { expr }
            | NodeKind::RuntimeTypeCheck { expr } => out.push(expr),
            NodeKind::Dictionary { entries } | NodeKind::Mapping { entries } => out.extend(entries.iter()),
            NodeKind::DictEntry { key, value }
            | NodeKind::StaticMappingEntry { key, value }
            | NodeKind::DynamicMappingEntry { key, value, .. } => {
                out.push(key);
                out.push(value);
            }
            NodeKind::FnExpr {
                params,
                return_type,
                body,
                ..
            } => {
                out.extend(params.iter());
                out.extend(return_type.as_deref());
                out.push(body);
            }
            NodeKind::Param { ty, .. } => out.extend(ty.as_deref()),
            NodeKind::PointerType { value } => out.push(value),
            NodeKind::Readonly { pattern } => out.push(pattern),
            NodeKind::New { ty, init } => {
                out.push(ty);
                out.extend(init.as_deref());
            }
            NodeKind::StructInit { fields } => out.extend(fields.iter()),
            NodeKind::StructFieldInit { value, .. } => out.push(value),
            NodeKind::Spawn { meta, module }
            | NodeKind::TestSuite { meta, module, .. }
            | NodeKind::TestCase { meta, module, .. } => {
                out.extend(meta.as_deref());
                out.push(module);
            }
            NodeKind::ReceptionHandler { pattern, handler } => {
                out.push(pattern);
                out.push(handler);
            }
            NodeKind::SendValue { value, receiver } => {
                out.push(value);
                out.push(receiver);
            }
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Prune
            | NodeKind::Variable(_)
            | NodeKind::GlobalVariable(_)
            | NodeKind::Ident(_)
            | NodeKind::SelfExpr
            | NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::Nil
            | NodeKind::Quantity { .. }
            | NodeKind::Rate { .. }
            | NodeKind::AbsPath(_)
            | NodeKind::RelPath(_)
            | NodeKind::Url(_)
            | NodeKind::Host(_)
            | NodeKind::KeyList { .. }
            | NodeKind::PatternIdent { .. }
            | NodeKind::PatternNsIdent(_)
            | NodeKind::PatternNsMember { .. }
            | NodeKind::Invalid => {}
        }
        out
    }

    /// Statements of a chunk, embedded module or block.
    pub fn statements(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Chunk { statements, .. }
            | NodeKind::EmbeddedModule { statements, .. }
            | NodeKind::Block { statements } => statements,
            _ => &[],
        }
    }

    /// The manifest of a chunk or embedded module.
    pub fn manifest(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Chunk { manifest, .. } | NodeKind::EmbeddedModule { manifest, .. } => {
                manifest.as_deref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: NodeKind) -> Node {
        Node::new(kind, Span::dummy())
    }

    #[test]
    fn test_node_ids_are_unique() {
        let a = leaf(NodeKind::Nil);
        let b = leaf(NodeKind::Nil);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_children_order() {
        let assignment = leaf(NodeKind::Assignment {
            left: Box::new(leaf(NodeKind::Variable("a".into()))),
            op: AssignOp::Assign,
            right: Box::new(leaf(NodeKind::Int(1))),
        });
        let children = assignment.children();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0].kind, NodeKind::Variable(_)));
        assert!(matches!(children[1].kind, NodeKind::Int(1)));
    }

    #[test]
    fn test_scope_containers() {
        assert!(NodeKind::Chunk {
            manifest: None,
            includable: false,
            statements: vec![]
        }
        .is_scope_container());
        assert!(!NodeKind::Block { statements: vec![] }.is_scope_container());
    }
}
