use std::fmt::Display;
use std::rc::Rc;

use tools::position::Span;

#[derive(Debug, PartialEq, Clone)]
pub struct ASTNode {
    pub kind: NodeKind,
    pub span: Span,
}

impl ASTNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum NumberLiteral {
    Int(i64),
    Float(f64),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    // Maps an operator token text to its operator
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "^" => Self::Pow,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::Less,
            ">" => Self::Greater,
            "<=" => Self::LessEqual,
            ">=" => Self::GreaterEqual,
            "and" => Self::And,
            "or" => Self::Or,
            _ => return None,
        };

        Some(op)
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
        };

        write!(f, "{}", symbol)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Not => write!(f, "not "),
        }
    }
}

// One `if`/`elif` arm. Multi-line arms discard their value
#[derive(Debug, PartialEq, Clone)]
pub struct IfCase {
    pub condition: ASTNode,
    pub body: ASTNode,
    pub discard: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ElseCase {
    pub body: Box<ASTNode>,
    pub discard: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ForRange {
    Numeric {
        start: Box<ASTNode>,
        end: Box<ASTNode>,
        step: Option<Box<ASTNode>>,
    },
    Each {
        iterable: Box<ASTNode>,
    },
}

// Shared with the function values built from it, the body outlives the parse
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDefinition {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: ASTNode,
    pub auto_return: bool,
    // Names this function reads through `nonlocal`
    pub free_vars: Vec<String>,
    // Names the functions nested one level inside read through `nonlocal`
    pub cell_vars: Vec<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum NodeKind {
    Number(NumberLiteral),
    String(String),
    VarAccess {
        name: String,
    },
    VarAssign {
        name: String,
        value: Box<ASTNode>,
    },
    BinaryOp {
        left: Box<ASTNode>,
        operator: BinaryOperator,
        right: Box<ASTNode>,
    },
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<ASTNode>,
    },
    List {
        elements: Vec<ASTNode>,
    },
    Dictionary {
        entries: Vec<(ASTNode, ASTNode)>,
    },
    // Statements separated by new lines
    Block {
        statements: Vec<ASTNode>,
    },
    If {
        cases: Vec<IfCase>,
        else_case: Option<ElseCase>,
    },
    For {
        var: String,
        range: ForRange,
        body: Box<ASTNode>,
        discard: bool,
    },
    While {
        condition: Box<ASTNode>,
        body: Box<ASTNode>,
    },
    FunctionDef(Rc<FunctionDefinition>),
    FunctionCall {
        target: Box<ASTNode>,
        args: Vec<ASTNode>,
    },
    Return {
        value: Option<Box<ASTNode>>,
    },
    Break,
    Continue,
    // `value` is set when the access is an assignment target
    Subscription {
        target: Box<ASTNode>,
        index: Box<ASTNode>,
        value: Option<Box<ASTNode>>,
    },
    Attribution {
        target: Box<ASTNode>,
        attr: String,
        value: Option<Box<ASTNode>>,
    },
    AttributionCall {
        target: Box<ASTNode>,
        attr: String,
        args: Vec<ASTNode>,
    },
    // Root of a postfix chain of two or more steps
    AdvancedAccess {
        chain: Box<ASTNode>,
    },
    NewExpression {
        prototype: Box<ASTNode>,
        args: Vec<ASTNode>,
    },
    Nonlocal {
        name: String,
    },
    Defer {
        expr: Rc<ASTNode>,
    },
}

fn join(nodes: &[ASTNode], sep: &str) -> String {
    nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn assigned(f: &mut std::fmt::Formatter<'_>, access: String, value: &Option<Box<ASTNode>>) -> std::fmt::Result {
    match value {
        Some(v) => write!(f, "({} = {})", access, v),
        None => write!(f, "{}", access),
    }
}

// Fully parenthesised rendering, one pair per operation
impl Display for ASTNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NodeKind::Number(NumberLiteral::Int(v)) => write!(f, "{}", v),
            NodeKind::Number(NumberLiteral::Float(v)) => write!(f, "{:?}", v),
            NodeKind::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            NodeKind::VarAccess { name } => write!(f, "{}", name),
            NodeKind::VarAssign { name, value } => write!(f, "(var {} = {})", name, value),
            NodeKind::BinaryOp { left, operator, right } => {
                write!(f, "({} {} {})", left, operator, right)
            }
            NodeKind::UnaryOp { operator, operand } => write!(f, "({}{})", operator, operand),
            NodeKind::List { elements } => write!(f, "[{}]", join(elements, ", ")),
            NodeKind::Dictionary { entries } => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", entries)
            }
            NodeKind::Block { statements } => write!(f, "(block {})", join(statements, "; ")),
            NodeKind::If { cases, else_case } => {
                for (idx, case) in cases.iter().enumerate() {
                    let kw = if idx == 0 { "(if" } else { " elif" };
                    write!(f, "{} {} then {}", kw, case.condition, case.body)?;
                }
                if let Some(else_case) = else_case {
                    write!(f, " else {}", else_case.body)?;
                }
                write!(f, ")")
            }
            NodeKind::For { var, range, body, .. } => match range {
                ForRange::Numeric { start, end, step } => {
                    write!(f, "(for {} = {} to {}", var, start, end)?;
                    if let Some(step) = step {
                        write!(f, " step {}", step)?;
                    }
                    write!(f, " then {})", body)
                }
                ForRange::Each { iterable } => {
                    write!(f, "(for {} in {} then {})", var, iterable, body)
                }
            },
            NodeKind::While { condition, body } => write!(f, "(while {} then {})", condition, body),
            NodeKind::FunctionDef(def) => {
                let name = def.name.as_deref().unwrap_or("");
                if def.auto_return {
                    write!(f, "(function {}({}) -> {})", name, def.params.join(", "), def.body)
                } else {
                    write!(f, "(function {}({}) {} end)", name, def.params.join(", "), def.body)
                }
            }
            NodeKind::FunctionCall { target, args } => write!(f, "{}({})", target, join(args, ", ")),
            NodeKind::Return { value: Some(v) } => write!(f, "(return {})", v),
            NodeKind::Return { value: None } => write!(f, "(return)"),
            NodeKind::Break => write!(f, "break"),
            NodeKind::Continue => write!(f, "continue"),
            NodeKind::Subscription { target, index, value } => {
                assigned(f, format!("{}[{}]", target, index), value)
            }
            NodeKind::Attribution { target, attr, value } => {
                assigned(f, format!("{}.{}", target, attr), value)
            }
            NodeKind::AttributionCall { target, attr, args } => {
                write!(f, "{}.{}({})", target, attr, join(args, ", "))
            }
            NodeKind::AdvancedAccess { chain } => write!(f, "{}", chain),
            NodeKind::NewExpression { prototype, args } => {
                write!(f, "(new {}({}))", prototype, join(args, ", "))
            }
            NodeKind::Nonlocal { name } => write!(f, "(nonlocal {})", name),
            NodeKind::Defer { expr } => write!(f, "(defer {})", expr),
        }
    }
}
