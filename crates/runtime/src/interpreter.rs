mod call;
mod expr;
mod interp_errors;
mod stmt;
#[cfg(test)]
mod tests;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

use frontend::ast::{ASTNode, NodeKind};
use frontend::lexer::Lexer;
use frontend::parser::Parser;
use tools::errors::ReportCodeErr;
use tools::position::Span;

pub(crate) use call::{LAST_EXCEPTION, RECOVERED};
pub use interp_errors::{Exception, InterpreterError, RunError};

use crate::config::Config;
use crate::environment::{Context, SharedTable, SymbolTable};
use crate::native_functions;
use crate::values::Value;

// Why the evaluation of a node stopped before producing a value
#[derive(Debug)]
pub enum Signal {
    Return(Value),
    Break(Span),
    Continue(Span),
    Error(Box<Exception>),
}

pub type RuntimeResult = Result<Value, Signal>;

pub struct Interpreter {
    pub config: Config,
    // Built-in functions and constants, parent of every global table
    builtins: SharedTable,
    out: RefCell<Box<dyn Write>>,
    depth: Cell<usize>,
    // Contexts of the modules already loaded by `require`
    pub(crate) modules: RefCell<HashMap<String, Rc<Context>>>,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self::with_output(config, Box::new(io::stdout()))
    }

    // Output of print, println and input prompts goes to `out`
    pub fn with_output(config: Config, out: Box<dyn Write>) -> Self {
        let builtins = SymbolTable::shared(None);
        native_functions::register(&mut builtins.borrow_mut());

        Self {
            config,
            builtins,
            out: RefCell::new(out),
            depth: Cell::new(0),
            modules: RefCell::new(HashMap::new()),
        }
    }

    pub fn builtins(&self) -> &SharedTable {
        &self.builtins
    }

    // Fresh top-level frame, its globals see the built-ins
    pub fn global_context(&self, label: &str) -> Rc<Context> {
        Context::root(label, SymbolTable::shared(Some(self.builtins.clone())))
    }

    pub fn parse(source: &str, filename: &str) -> Result<ASTNode, RunError> {
        let mut lexer = Lexer::new(filename);
        lexer.tokenize(source.to_string())?;

        let mut parser = Parser::default();
        Ok(parser.build_ast(lexer.tokens)?)
    }

    // Parses and runs a whole source, returns the value of each top-level statement
    pub fn run(&self, source: &str, filename: &str, ctx: &Rc<Context>) -> Result<Vec<Value>, RunError> {
        let program = Self::parse(source, filename)?;
        self.execute_program(&program, ctx)
            .map_err(RunError::Runtime)
    }

    pub fn execute_program(&self, program: &ASTNode, ctx: &Rc<Context>) -> Result<Vec<Value>, Box<Exception>> {
        let statements = match &program.kind {
            NodeKind::Block { statements } => statements.as_slice(),
            _ => std::slice::from_ref(program),
        };

        let mut values = Vec::with_capacity(statements.len());

        for statement in statements {
            let value = self
                .evaluate(statement, ctx)
                .or_else(|signal| self.settle(signal, ctx))?;
            values.push(value);
        }

        debug!(frame = %ctx.label, statements = values.len(), "program executed");

        Ok(values)
    }

    // Control signals that reach a frame boundary
    pub(crate) fn settle(&self, signal: Signal, ctx: &Rc<Context>) -> Result<Value, Box<Exception>> {
        match signal {
            Signal::Return(value) => Ok(value),
            Signal::Break(span) => Err(self.exception(InterpreterError::OutsideLoop("break"), &span, ctx)),
            Signal::Continue(span) => Err(self.exception(InterpreterError::OutsideLoop("continue"), &span, ctx)),
            Signal::Error(e) => Err(e),
        }
    }

    pub fn evaluate(&self, node: &ASTNode, ctx: &Rc<Context>) -> RuntimeResult {
        match &node.kind {
            NodeKind::Number(_) | NodeKind::String(_) => self.eval_literal(node),
            NodeKind::VarAccess { name } => self.eval_var_access(name, node, ctx),
            NodeKind::VarAssign { name, value } => self.eval_var_assign(name, value, ctx),
            NodeKind::BinaryOp { left, operator, right } => {
                self.eval_binary_op(left, *operator, right, node, ctx)
            }
            NodeKind::UnaryOp { operator, operand } => self.eval_unary_op(*operator, operand, node, ctx),
            NodeKind::List { elements } => self.eval_list(elements, ctx),
            NodeKind::Dictionary { entries } => self.eval_dictionary(entries, node, ctx),
            NodeKind::Block { statements } => self.eval_block(statements, ctx),
            NodeKind::If { cases, else_case } => self.eval_if(cases, else_case.as_ref(), ctx),
            NodeKind::For { var, range, body, discard } => self.eval_for(var, range, body, *discard, node, ctx),
            NodeKind::While { condition, body } => self.eval_while(condition, body, ctx),
            NodeKind::FunctionDef(definition) => self.eval_function_def(definition, ctx),
            NodeKind::FunctionCall { target, args } => self.eval_call(target, args, node, ctx),
            NodeKind::Return { value } => self.eval_return(value.as_deref(), ctx),
            NodeKind::Break => Err(Signal::Break(node.span.clone())),
            NodeKind::Continue => Err(Signal::Continue(node.span.clone())),
            NodeKind::Subscription { target, index, value } => {
                self.eval_subscription(target, index, value.as_deref(), node, ctx)
            }
            NodeKind::Attribution { target, attr, value } => {
                self.eval_attribution(target, attr, value.as_deref(), node, ctx)
            }
            NodeKind::AttributionCall { target, attr, args } => {
                self.eval_attribution_call(target, attr, args, node, ctx)
            }
            NodeKind::AdvancedAccess { chain } => self.evaluate(chain, ctx),
            NodeKind::NewExpression { prototype, args } => self.eval_new(prototype, args, node, ctx),
            NodeKind::Nonlocal { name } => self.eval_nonlocal(name, node, ctx),
            NodeKind::Defer { expr } => self.eval_defer(expr, ctx),
        }
    }

    pub(crate) fn exception(&self, err: impl ReportCodeErr, span: &Span, ctx: &Context) -> Box<Exception> {
        Box::new(Exception::new(&err, &span.start, ctx))
    }

    pub(crate) fn error(&self, err: impl ReportCodeErr, span: &Span, ctx: &Context) -> Signal {
        Signal::Error(self.exception(err, span, ctx))
    }

    pub(crate) fn write(&self, text: &str) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}
