// TSJVM AST Definitions
// Statically-annotated syntax tree handed to the compiler by the front-end

/// Source position information for AST nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.start.into(), span.len())
    }
}

impl From<&Span> for miette::SourceSpan {
    fn from(span: &Span) -> Self {
        (*span).into()
    }
}

/// A single-method compilation request: local declarations followed by
/// the expression whose value the unit produces.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub name: String,
    pub declarations: Vec<VariableDeclaration>,
    pub body: Expression,
    pub return_type: Option<TypeAnnotation>,
    pub span: Span,
}

/// `const name: Type = initializer`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: Identifier,
    pub type_annotation: Option<TypeAnnotation>,
    pub initializer: Option<Expression>,
    pub span: Span,
}

/// Identifiers (variable names, property names)
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Declared type descriptors attached by the surrounding declaration context
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    /// `int`, `Integer`, `string`, `Object`, ...
    Simple { name: String, span: Span },
    /// `Record<K, V>`, `Array<T>`
    Generic {
        name: String,
        args: Vec<TypeAnnotation>,
        span: Span,
    },
}

impl TypeAnnotation {
    pub fn name(&self) -> &str {
        match self {
            TypeAnnotation::Simple { name, .. } | TypeAnnotation::Generic { name, .. } => name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeAnnotation::Simple { span, .. } | TypeAnnotation::Generic { span, .. } => *span,
        }
    }
}

/// Expression with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    /// Relocate this expression (builder convenience)
    pub fn at(mut self, start: usize, end: usize) -> Self {
        self.span = Span::new(start, end);
        self
    }

    /// Strip any number of redundant parentheses
    pub fn unparenthesized(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Parenthesized(inner) => inner.unparenthesized(),
            _ => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Integer(IntegerLiteral),
    Float(FloatLiteral),
    String(StringLiteral),
    Boolean(BooleanLiteral),
    Null(NullLiteral),
    Identifier(Identifier),
    BinaryOp(BinaryOperation),
    UnaryOp(UnaryOperation),
    Update(UpdateExpression),
    Assignment(Assignment),
    Conditional(ConditionalExpression),
    Cast(CastExpression),
    Object(ObjectLiteral),
    Array(ArrayLiteral),
    Symbol(SymbolExpression),
    Parenthesized(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral {
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatLiteral {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullLiteral {
    pub span: Span,
}

/// Binary operations with operator tracking
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperation {
    pub left: Box<Expression>,
    pub operator: BinaryOperator,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic operators
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Modulo,   // %
    Exponent, // **

    // Comparison operators
    Equal,          // ==
    NotEqual,       // !=
    StrictEqual,    // ===
    StrictNotEqual, // !==
    Less,           // <
    LessEqual,      // <=
    Greater,        // >
    GreaterEqual,   // >=

    // Logical operators
    LogicalAnd, // &&
    LogicalOr,  // ||

    // Bitwise operators
    BitwiseAnd,         // &
    BitwiseOr,          // |
    BitwiseXor,         // ^
    ShiftLeft,          // <<
    ShiftRight,         // >>
    UnsignedShiftRight, // >>>

    // Accepted by the front-end, not lowered by this core
    NullishCoalescing, // ??
    In,                // in
    InstanceOf,        // instanceof
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::UnsignedShiftRight => ">>>",
            BinaryOperator::NullishCoalescing => "??",
            BinaryOperator::In => "in",
            BinaryOperator::InstanceOf => "instanceof",
        }
    }
}

/// Unary operations with operator tracking
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperation {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,       // +
    Minus,      // -
    LogicalNot, // !
    BitwiseNot, // ~
    TypeOf,     // typeof
    Void,       // void
    Delete,     // delete
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::TypeOf => "typeof ",
            UnaryOperator::Void => "void ",
            UnaryOperator::Delete => "delete ",
        }
    }
}

/// `++x`, `x--`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub prefix: bool,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Increment, // ++
    Decrement, // --
}

/// `x = value`, `x += value`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Box<Expression>,
    pub operator: AssignmentOperator,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,                   // =
    AddAssign,                // +=
    SubtractAssign,           // -=
    MultiplyAssign,           // *=
    DivideAssign,             // /=
    ModuloAssign,             // %=
    ShiftLeftAssign,          // <<=
    ShiftRightAssign,         // >>=
    UnsignedShiftRightAssign, // >>>=
    BitwiseAndAssign,         // &=
    BitwiseOrAssign,          // |=
    BitwiseXorAssign,         // ^=
}

impl AssignmentOperator {
    /// Binary operator applied by a compound assignment, `None` for plain `=`
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractAssign => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyAssign => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideAssign => Some(BinaryOperator::Divide),
            AssignmentOperator::ModuloAssign => Some(BinaryOperator::Modulo),
            AssignmentOperator::ShiftLeftAssign => Some(BinaryOperator::ShiftLeft),
            AssignmentOperator::ShiftRightAssign => Some(BinaryOperator::ShiftRight),
            AssignmentOperator::UnsignedShiftRightAssign => {
                Some(BinaryOperator::UnsignedShiftRight)
            }
            AssignmentOperator::BitwiseAndAssign => Some(BinaryOperator::BitwiseAnd),
            AssignmentOperator::BitwiseOrAssign => Some(BinaryOperator::BitwiseOr),
            AssignmentOperator::BitwiseXorAssign => Some(BinaryOperator::BitwiseXor),
        }
    }
}

/// `condition ? consequent : alternate`
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub condition: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

/// `expression as Type`
#[derive(Debug, Clone, PartialEq)]
pub struct CastExpression {
    pub expression: Box<Expression>,
    pub target_type: TypeAnnotation,
    pub span: Span,
}

/// Object literal: `{ a: 1, [k]: v, x, ...other }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLiteral {
    pub properties: Vec<Property>,
    pub span: Span,
}

/// One entry of an object literal, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    KeyValue {
        key: PropertyKey,
        value: Expression,
        span: Span,
    },
    Shorthand(Identifier),
    Spread {
        expression: Expression,
        span: Span,
    },
    Method {
        key: PropertyKey,
        span: Span,
    },
    Getter {
        key: PropertyKey,
        span: Span,
    },
    Setter {
        key: PropertyKey,
        span: Span,
    },
}

impl Property {
    pub fn span(&self) -> Span {
        match self {
            Property::KeyValue { span, .. }
            | Property::Spread { span, .. }
            | Property::Method { span, .. }
            | Property::Getter { span, .. }
            | Property::Setter { span, .. } => *span,
            Property::Shorthand(identifier) => identifier.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Identifier(Identifier),
    String(StringLiteral),
    Integer(IntegerLiteral),
    Float(FloatLiteral),
    Boolean(BooleanLiteral),
    Null(NullLiteral),
    Computed {
        expression: Box<Expression>,
        span: Span,
    },
}

impl PropertyKey {
    pub fn span(&self) -> Span {
        match self {
            PropertyKey::Identifier(identifier) => identifier.span,
            PropertyKey::String(literal) => literal.span,
            PropertyKey::Integer(literal) => literal.span,
            PropertyKey::Float(literal) => literal.span,
            PropertyKey::Boolean(literal) => literal.span,
            PropertyKey::Null(literal) => literal.span,
            PropertyKey::Computed { span, .. } => *span,
        }
    }
}

/// Array literal: `[a, b, c]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
    pub span: Span,
}

/// `Symbol("description")` or a well-known symbol such as `Symbol.iterator`
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolExpression {
    pub description: String,
    pub well_known: bool,
    pub span: Span,
}

// Display implementations for source reconstruction

impl std::fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Simple { name, .. } => write!(f, "{}", name),
            TypeAnnotation::Generic { name, args, .. } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl std::fmt::Display for IntegerLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for FloatLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.fract() == 0.0 && self.value.is_finite() {
            write!(f, "{:.1}", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl std::fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl std::fmt::Display for BooleanLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.value { "true" } else { "false" })
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for AssignmentOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.binary_operator() {
            Some(op) => write!(f, "{}=", op),
            None => write!(f, "="),
        }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyKey::Identifier(identifier) => write!(f, "{}", identifier),
            PropertyKey::String(literal) => write!(f, "{}", literal),
            PropertyKey::Integer(literal) => write!(f, "{}", literal),
            PropertyKey::Float(literal) => write!(f, "{}", literal),
            PropertyKey::Boolean(literal) => write!(f, "{}", literal),
            PropertyKey::Null(_) => write!(f, "null"),
            PropertyKey::Computed { expression, .. } => write!(f, "[{}]", expression),
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Property::KeyValue { key, value, .. } => write!(f, "{}: {}", key, value),
            Property::Shorthand(identifier) => write!(f, "{}", identifier),
            Property::Spread { expression, .. } => write!(f, "...{}", expression),
            Property::Method { key, .. } => write!(f, "{}() {{}}", key),
            Property::Getter { key, .. } => write!(f, "get {}() {{}}", key),
            Property::Setter { key, .. } => write!(f, "set {}(value) {{}}", key),
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExpressionKind::Integer(literal) => write!(f, "{}", literal),
            ExpressionKind::Float(literal) => write!(f, "{}", literal),
            ExpressionKind::String(literal) => write!(f, "{}", literal),
            ExpressionKind::Boolean(literal) => write!(f, "{}", literal),
            ExpressionKind::Null(_) => write!(f, "null"),
            ExpressionKind::Identifier(identifier) => write!(f, "{}", identifier),
            ExpressionKind::BinaryOp(op) => {
                write!(f, "{} {} {}", op.left, op.operator, op.right)
            }
            ExpressionKind::UnaryOp(op) => write!(f, "{}{}", op.operator, op.operand),
            ExpressionKind::Update(update) => {
                let symbol = match update.operator {
                    UpdateOperator::Increment => "++",
                    UpdateOperator::Decrement => "--",
                };
                if update.prefix {
                    write!(f, "{}{}", symbol, update.argument)
                } else {
                    write!(f, "{}{}", update.argument, symbol)
                }
            }
            ExpressionKind::Assignment(assignment) => write!(
                f,
                "{} {} {}",
                assignment.target, assignment.operator, assignment.value
            ),
            ExpressionKind::Conditional(conditional) => write!(
                f,
                "{} ? {} : {}",
                conditional.condition, conditional.consequent, conditional.alternate
            ),
            ExpressionKind::Cast(cast) => write!(f, "{} as {}", cast.expression, cast.target_type),
            ExpressionKind::Object(object) => {
                if object.properties.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, property) in object.properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", property)?;
                }
                write!(f, " }}")
            }
            ExpressionKind::Array(array) => {
                write!(f, "[")?;
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            ExpressionKind::Symbol(symbol) => {
                if symbol.well_known {
                    write!(f, "Symbol.{}", symbol.description)
                } else {
                    write!(f, "Symbol({:?})", symbol.description)
                }
            }
            ExpressionKind::Parenthesized(inner) => write!(f, "({})", inner),
        }
    }
}
