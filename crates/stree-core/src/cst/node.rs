//! Syntax tree node types
//!
//! Every node is a [`Node`]: a location, the comments attached to it, and a
//! [`NodeKind`] holding one of the variant structs below. The variant table is
//! written once in [`define_nodes!`], which generates the structs, the
//! [`NodeKind`] and [`NodeTag`] enums, child iteration and field listing.
//!
//! Children are owned (`Box<Node>`, `Option<Box<Node>>` or `Vec<Node>`), so
//! the tree is strictly tree-shaped.

use super::location::Location;
use serde::Serialize;

/// Where an attached comment sits relative to its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    None,
    Leading,
    Trailing,
}

/// A `#` comment or an `=begin`/`=end` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub value: String,
    /// Shares its line with code before it
    pub inline: bool,
    pub location: Location,
    pub placement: Placement,
    /// `=begin`/`=end` document rather than a line comment
    pub embdoc: bool,
}

impl Comment {
    pub fn new(value: impl Into<String>, inline: bool, location: Location) -> Self {
        Self {
            value: value.into(),
            inline,
            location,
            placement: Placement::None,
            embdoc: false,
        }
    }

    pub fn embdoc(value: impl Into<String>, location: Location) -> Self {
        Self {
            embdoc: true,
            ..Self::new(value, false, location)
        }
    }

    /// `# stree-ignore`, allowing whitespace around the marker
    pub fn is_ignore(&self) -> bool {
        if self.embdoc {
            return false;
        }
        self.value
            .strip_prefix('#')
            .map(|rest| rest.trim() == "stree-ignore")
            .unwrap_or(false)
    }

    pub fn is_leading(&self) -> bool {
        self.placement == Placement::Leading
    }

    pub fn is_trailing(&self) -> bool {
        self.placement == Placement::Trailing
    }

    /// Turn the comment into a statement-list entry
    pub fn into_node(self) -> Node {
        let location = self.location;
        if self.embdoc {
            Node::new(EmbDoc { value: self.value }, location)
        } else {
            Node::new(
                CommentNode {
                    value: self.value,
                    inline: self.inline,
                },
                location,
            )
        }
    }
}

/// Borrowed view of one field, used by dumps
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Node(&'a Node),
    OptionalNode(Option<&'a Node>),
    Nodes(&'a [Node]),
    Str(&'a str),
    Bool(bool),
    Int(usize),
}

/// A field of a node variant: either children or plain data
pub trait NodeField {
    fn collect<'a>(&'a self, _out: &mut Vec<&'a Node>) {}
    fn collect_mut<'a>(&'a mut self, _out: &mut Vec<&'a mut Node>) {}
    fn field(&self) -> FieldRef<'_>;
}

impl NodeField for Box<Node> {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>) {
        out.push(self);
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
        out.push(self);
    }

    fn field(&self) -> FieldRef<'_> {
        FieldRef::Node(self)
    }
}

impl NodeField for Option<Box<Node>> {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if let Some(node) = self {
            out.push(node);
        }
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
        if let Some(node) = self {
            out.push(node);
        }
    }

    fn field(&self) -> FieldRef<'_> {
        FieldRef::OptionalNode(self.as_deref())
    }
}

impl NodeField for Vec<Node> {
    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>) {
        out.extend(self.iter());
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
        out.extend(self.iter_mut());
    }

    fn field(&self) -> FieldRef<'_> {
        FieldRef::Nodes(self)
    }
}

impl NodeField for String {
    fn field(&self) -> FieldRef<'_> {
        FieldRef::Str(self)
    }
}

impl NodeField for bool {
    fn field(&self) -> FieldRef<'_> {
        FieldRef::Bool(*self)
    }
}

impl NodeField for usize {
    fn field(&self) -> FieldRef<'_> {
        FieldRef::Int(*self)
    }
}

macro_rules! define_nodes {
    ($(
        $(#[$meta:meta])*
        $name:ident($type_name:literal) { $( $field:ident : $ty:ty ),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $name {
                $( pub $field: $ty, )*
            }

            impl From<$name> for NodeKind {
                fn from(value: $name) -> Self {
                    NodeKind::$name(value)
                }
            }
        )*

        #[derive(Debug, Clone, PartialEq)]
        pub enum NodeKind {
            $( $name($name), )*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NodeTag {
            $( $name, )*
        }

        impl NodeTag {
            /// Variant name as it appears in dumps
            pub fn type_name(self) -> &'static str {
                match self {
                    $( NodeTag::$name => $type_name, )*
                }
            }
        }

        impl NodeKind {
            pub fn tag(&self) -> NodeTag {
                match self {
                    $( NodeKind::$name(_) => NodeTag::$name, )*
                }
            }

            #[allow(unused_variables)]
            fn collect_children<'a>(&'a self, out: &mut Vec<&'a Node>) {
                match self {
                    $( NodeKind::$name(inner) => { $( NodeField::collect(&inner.$field, out); )* } )*
                }
            }

            #[allow(unused_variables)]
            fn collect_children_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Node>) {
                match self {
                    $( NodeKind::$name(inner) => { $( NodeField::collect_mut(&mut inner.$field, out); )* } )*
                }
            }

            #[allow(unused_variables, unused_mut)]
            fn fields(&self) -> Vec<(&'static str, FieldRef<'_>)> {
                let mut fields = Vec::new();
                match self {
                    $( NodeKind::$name(inner) => { $( fields.push((stringify!($field), NodeField::field(&inner.$field))); )* } )*
                }
                fields
            }
        }
    };
}

define_nodes! {
    // Structure
    Program("program") { statements: Box<Node> }
    Statements("statements") { body: Vec<Node> }
    /// Placeholder for an empty statement list or a bare `;`
    VoidStmt("void_stmt") {}
    /// A comment spliced into a statement list
    CommentNode("comment") { value: String, inline: bool }
    EmbDoc("embdoc") { value: String }
    /// Everything after `__END__`
    EndContent("__end__") { value: String }

    // Tokens
    Ident("ident") { value: String }
    Const("const") { value: String }
    IVar("ivar") { value: String }
    CVar("cvar") { value: String }
    GVar("gvar") { value: String }
    Backref("backref") { value: String }
    Label("label") { value: String }
    Kw("kw") { value: String }
    Op("op") { value: String }
    Period("period") { value: String }
    Int("int") { value: String }
    FloatLiteral("float") { value: String }
    RationalLiteral("rational") { value: String }
    Imaginary("imaginary") { value: String }
    CharLiteral("CHAR") { value: String }
    TStringContent("tstring_content") { value: String }
    LParen("lparen") { value: String }
    RParen("rparen") { value: String }
    LBrace("lbrace") { value: String }
    RBrace("rbrace") { value: String }
    LBracket("lbracket") { value: String }
    RBracket("rbracket") { value: String }
    TStringBeg("tstring_beg") { value: String }
    TStringEnd("tstring_end") { value: String }
    SymBeg("symbeg") { value: String }
    LabelEnd("label_end") { value: String }
    HeredocBeg("heredoc_beg") { value: String }
    HeredocEnd("heredoc_end") { value: String }
    RegexpBeg("regexp_beg") { value: String }
    RegexpEnd("regexp_end") { value: String }
    EmbExprBeg("embexpr_beg") { value: String }
    EmbExprEnd("embexpr_end") { value: String }
    Backtick("backtick") { value: String }
    WordsBeg("words_beg") { value: String }
    QWordsBeg("qwords_beg") { value: String }
    SymbolsBeg("symbols_beg") { value: String }
    QSymbolsBeg("qsymbols_beg") { value: String }
    TLambda("tlambda") { value: String }
    TLamBeg("tlambeg") { value: String }
    Comma("comma") { value: String }

    // Variables and references
    VarRef("var_ref") { value: Box<Node> }
    /// `^name` inside a pattern
    PinnedVarRef("pinned_var_ref") { value: Box<Node> }
    /// Assignment target; empty for an anonymous splat
    VarField("var_field") { value: Option<Box<Node>> }
    /// Bare identifier that is not a known local
    VCall("vcall") { value: Box<Node> }
    ConstRef("const_ref") { constant: Box<Node> }
    ConstPathRef("const_path_ref") { parent: Box<Node>, constant: Box<Node> }
    ConstPathField("const_path_field") { parent: Box<Node>, constant: Box<Node> }
    TopConstRef("top_const_ref") { constant: Box<Node> }
    TopConstField("top_const_field") { constant: Box<Node> }
    /// Attribute assignment target `recv.name`
    Field("field") { parent: Box<Node>, operator: Box<Node>, name: Box<Node> }
    ARef("aref") { collection: Box<Node>, index: Option<Box<Node>> }
    ARefField("aref_field") { collection: Box<Node>, index: Option<Box<Node>> }

    // Literals
    /// `quote` is the opening delimiter as written
    StringLiteral("string_literal") { parts: Vec<Node>, quote: String }
    /// Parts of a string that is still being assembled
    StringContent("string_content") { parts: Vec<Node> }
    /// Adjacent literals joined with a backslash line continuation
    StringConcat("string_concat") { left: Box<Node>, right: Box<Node> }
    StringEmbExpr("string_embexpr") { statements: Box<Node> }
    StringDVar("string_dvar") { variable: Box<Node> }
    XStringLiteral("xstring_literal") { parts: Vec<Node> }
    Heredoc("heredoc") { beginning: Box<Node>, parts: Vec<Node>, ending: Box<Node>, dedent: usize }
    SymbolLiteral("symbol_literal") { value: Box<Node> }
    DynaSymbol("dyna_symbol") { parts: Vec<Node>, quote: String }
    /// Bare method name used by `alias` and `undef`
    SymbolContent("symbol") { value: Box<Node> }
    RegexpLiteral("regexp_literal") { beginning: String, parts: Vec<Node>, ending: String }
    ArrayLiteral("array") { lbracket: Box<Node>, contents: Option<Box<Node>> }
    Words("words") { beginning: Box<Node>, elements: Vec<Node> }
    QWords("qwords") { beginning: Box<Node>, elements: Vec<Node> }
    Symbols("symbols") { beginning: Box<Node>, elements: Vec<Node> }
    QSymbols("qsymbols") { beginning: Box<Node>, elements: Vec<Node> }
    Word("word") { parts: Vec<Node> }
    HashLiteral("hash") { lbrace: Box<Node>, assocs: Vec<Node> }
    BareAssocHash("bare_assoc_hash") { assocs: Vec<Node> }
    /// `key => value` or `label: value`; the value is absent for `{ x: }`
    Assoc("assoc") { key: Box<Node>, value: Option<Box<Node>> }
    AssocSplat("assoc_splat") { value: Option<Box<Node>> }
    RangeNode("range") { left: Option<Box<Node>>, operator: Box<Node>, right: Option<Box<Node>> }
    Lambda("lambda") { params: Box<Node>, statements: Box<Node> }
    LambdaVar("lambda_var") { params: Box<Node>, locals: Vec<Node> }

    // Calls
    CallNode("call") {
        receiver: Option<Box<Node>>,
        operator: Option<Box<Node>>,
        message: Option<Box<Node>>,
        arguments: Option<Box<Node>>,
    }
    Command("command") { message: Box<Node>, arguments: Box<Node>, block: Option<Box<Node>> }
    CommandCall("command_call") {
        receiver: Box<Node>,
        operator: Box<Node>,
        message: Box<Node>,
        arguments: Option<Box<Node>>,
        block: Option<Box<Node>>,
    }
    MethodAddBlock("method_add_block") { call: Box<Node>, block: Box<Node> }
    /// `opening` is the `{` or `do` keyword
    BlockNode("block") { opening: Box<Node>, block_var: Option<Box<Node>>, bodystmt: Box<Node> }
    BlockVar("block_var") { params: Box<Node>, locals: Vec<Node> }
    Args("args") { parts: Vec<Node> }
    ArgParen("arg_paren") { arguments: Option<Box<Node>> }
    ArgStar("arg_star") { value: Option<Box<Node>> }
    ArgBlock("arg_block") { value: Option<Box<Node>> }
    ArgsForward("args_forward") {}
    Super("super") { arguments: Box<Node> }
    ZSuper("zsuper") {}
    YieldNode("yield") { arguments: Option<Box<Node>> }
    Defined("defined") { value: Box<Node> }

    // Operators
    Binary("binary") { left: Box<Node>, operator: String, right: Box<Node> }
    Unary("unary") { operator: String, statement: Box<Node> }
    Not("not") { statement: Option<Box<Node>>, parentheses: bool }
    IfOp("ifop") { predicate: Box<Node>, truthy: Box<Node>, falsy: Box<Node> }
    Assign("assign") { target: Box<Node>, value: Box<Node> }
    OpAssign("opassign") { target: Box<Node>, operator: Box<Node>, value: Box<Node> }
    MAssign("massign") { target: Box<Node>, value: Box<Node> }
    /// `comma` marks a trailing comma as in `a, = list`
    Mlhs("mlhs") { parts: Vec<Node>, comma: bool }
    MlhsParen("mlhs_paren") { contents: Box<Node> }
    Mrhs("mrhs") { parts: Vec<Node> }
    Paren("paren") { lparen: Box<Node>, contents: Option<Box<Node>> }

    // Control flow
    IfNode("if") { predicate: Box<Node>, statements: Box<Node>, consequent: Option<Box<Node>>, modifier: bool }
    UnlessNode("unless") { predicate: Box<Node>, statements: Box<Node>, consequent: Option<Box<Node>>, modifier: bool }
    Elsif("elsif") { predicate: Box<Node>, statements: Box<Node>, consequent: Option<Box<Node>> }
    Else("else") { keyword: Box<Node>, statements: Box<Node> }
    WhileNode("while") { predicate: Box<Node>, statements: Box<Node>, modifier: bool }
    UntilNode("until") { predicate: Box<Node>, statements: Box<Node>, modifier: bool }
    For("for") { index: Box<Node>, collection: Box<Node>, statements: Box<Node> }
    Case("case") { keyword: Box<Node>, value: Option<Box<Node>>, consequent: Box<Node> }
    When("when") { arguments: Box<Node>, statements: Box<Node>, consequent: Option<Box<Node>> }
    In("in") { pattern: Box<Node>, statements: Box<Node>, consequent: Option<Box<Node>> }
    /// `value => pattern` or `value in pattern`
    RAssign("rassign") { value: Box<Node>, operator: Box<Node>, pattern: Box<Node> }
    Begin("begin") { bodystmt: Box<Node> }
    PinnedBegin("pinned_begin") { statement: Box<Node> }
    BodyStmt("bodystmt") {
        statements: Box<Node>,
        rescue_clause: Option<Box<Node>>,
        else_keyword: Option<Box<Node>>,
        else_clause: Option<Box<Node>>,
        ensure_clause: Option<Box<Node>>,
    }
    Rescue("rescue") {
        keyword: Box<Node>,
        exception: Option<Box<Node>>,
        statements: Box<Node>,
        consequent: Option<Box<Node>>,
    }
    RescueEx("rescue_ex") { exceptions: Option<Box<Node>>, variable: Option<Box<Node>> }
    RescueMod("rescue_mod") { statement: Box<Node>, value: Box<Node> }
    Ensure("ensure") { keyword: Box<Node>, statements: Box<Node> }
    ReturnNode("return") { arguments: Option<Box<Node>> }
    Break("break") { arguments: Option<Box<Node>> }
    Next("next") { arguments: Option<Box<Node>> }
    Redo("redo") {}
    Retry("retry") {}
    BeginBlock("BEGIN") { lbrace: Box<Node>, statements: Box<Node> }
    EndBlock("END") { lbrace: Box<Node>, statements: Box<Node> }
    AliasNode("alias") { left: Box<Node>, right: Box<Node> }
    Undef("undef") { symbols: Vec<Node> }

    // Definitions
    /// Regular, singleton (`target` + `operator`) and endless definitions;
    /// an endless definition holds its expression directly in `bodystmt`
    DefNode("def") {
        target: Option<Box<Node>>,
        operator: Option<Box<Node>>,
        name: Box<Node>,
        params: Option<Box<Node>>,
        bodystmt: Box<Node>,
    }
    ClassDeclaration("class") { constant: Box<Node>, superclass: Option<Box<Node>>, bodystmt: Box<Node> }
    SClass("sclass") { target: Box<Node>, bodystmt: Box<Node> }
    ModuleDeclaration("module") { constant: Box<Node>, bodystmt: Box<Node> }
    Params("params") {
        requireds: Vec<Node>,
        optionals: Vec<Node>,
        rest: Option<Box<Node>>,
        posts: Vec<Node>,
        keywords: Vec<Node>,
        keyword_rest: Option<Box<Node>>,
        block: Option<Box<Node>>,
    }
    OptionalParam("optional_param") { name: Box<Node>, value: Box<Node> }
    KeywordParam("keyword_param") { name: Box<Node>, value: Option<Box<Node>> }
    RestParam("rest_param") { name: Option<Box<Node>> }
    KwRestParam("kwrest_param") { name: Option<Box<Node>> }
    BlockArg("blockarg") { name: Option<Box<Node>> }
    /// Trailing comma in block parameters, `|a,|`
    ExcessedComma("excessed_comma") {}
    /// `**nil`
    NoKwRest("nokw_rest") {}

    // Patterns
    AryPtn("aryptn") {
        constant: Option<Box<Node>>,
        requireds: Vec<Node>,
        rest: Option<Box<Node>>,
        posts: Vec<Node>,
    }
    HshPtn("hshptn") { constant: Option<Box<Node>>, keywords: Vec<Node>, keyword_rest: Option<Box<Node>> }
    FndPtn("fndptn") { constant: Option<Box<Node>>, left: Box<Node>, values: Vec<Node>, right: Box<Node> }
}

/// A located node with its attached comments
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub location: Location,
    pub comments: Vec<Comment>,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(kind: impl Into<NodeKind>, location: Location) -> Self {
        Self {
            location,
            comments: Vec::new(),
            kind: kind.into(),
        }
    }

    pub fn boxed(kind: impl Into<NodeKind>, location: Location) -> Box<Self> {
        Box::new(Self::new(kind, location))
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    pub fn is(&self, tag: NodeTag) -> bool {
        self.tag() == tag
    }

    pub fn type_name(&self) -> &'static str {
        self.tag().type_name()
    }

    pub fn start_char(&self) -> usize {
        self.location.start_char
    }

    pub fn end_char(&self) -> usize {
        self.location.end_char
    }

    /// Present children in field order
    pub fn child_nodes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.kind.collect_children(&mut out);
        out
    }

    /// Same order as [`Node::child_nodes`]
    pub fn child_nodes_mut(&mut self) -> Vec<&mut Node> {
        let mut out = Vec::new();
        self.kind.collect_children_mut(&mut out);
        out
    }

    /// Every field with its name, in declaration order
    pub fn fields(&self) -> Vec<(&'static str, FieldRef<'_>)> {
        self.kind.fields()
    }

    /// Text of a token node (`Ident`, `Op`, `Kw`, ...)
    pub fn token_value(&self) -> Option<&str> {
        match self.fields().as_slice() {
            [("value", FieldRef::Str(value))] => Some(*value),
            _ => None,
        }
    }

    /// Last line touched by this node or anything beneath it
    ///
    /// Differs from `location.end_line` when a heredoc body follows the
    /// line its opener sits on.
    pub fn last_line(&self) -> usize {
        self.child_nodes()
            .into_iter()
            .map(Node::last_line)
            .fold(self.location.end_line, usize::max)
    }

    pub fn has_comments(&self) -> bool {
        !self.comments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(start: usize, end: usize) -> Location {
        Location::token(1, start, start, end - start)
    }

    #[test]
    fn children_follow_field_order() {
        let left = Node::boxed(Int { value: "1".into() }, loc(0, 1));
        let right = Node::boxed(Int { value: "2".into() }, loc(4, 5));
        let binary = Node::new(
            Binary {
                left,
                operator: "+".into(),
                right,
            },
            loc(0, 5),
        );

        let children = binary.child_nodes();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].token_value(), Some("1"));
        assert_eq!(children[1].token_value(), Some("2"));
        assert_eq!(binary.type_name(), "binary");
    }

    #[test]
    fn absent_children_are_skipped() {
        let node = Node::new(
            ArgParen { arguments: None },
            loc(0, 2),
        );
        assert!(node.child_nodes().is_empty());
        assert!(node.token_value().is_none());
    }

    #[test]
    fn ignore_markers_tolerate_spacing() {
        let location = loc(0, 10);
        assert!(Comment::new("# stree-ignore", false, location).is_ignore());
        assert!(Comment::new("#stree-ignore  ", false, location).is_ignore());
        assert!(!Comment::new("# stree-ignore this", false, location).is_ignore());
        assert!(!Comment::embdoc("=begin\n# stree-ignore\n=end", location).is_ignore());
    }
}
