use std::rc::Rc;

use frontend::ast::{ASTNode, BinaryOperator, ElseCase, ForRange, IfCase};
use tools::errors::ErrorKind;

use super::expr::as_number;
use super::{Interpreter, InterpreterError, RuntimeResult, Signal};
use crate::environment::Context;
use crate::values::{Number, Value};

// What a loop does after one run of its body
enum Flow {
    Next(Option<Value>),
    Stop,
}

impl Interpreter {
    // Multi-line branches evaluate to null
    pub(super) fn eval_if(&self, cases: &[IfCase], else_case: Option<&ElseCase>, ctx: &Rc<Context>) -> RuntimeResult {
        for case in cases {
            let condition = self.evaluate(&case.condition, ctx)?;
            if condition.is_truthy() {
                let value = self.evaluate(&case.body, ctx)?;
                return Ok(if case.discard { Value::null() } else { value });
            }
        }

        match else_case {
            Some(else_case) => {
                let value = self.evaluate(&else_case.body, ctx)?;
                Ok(if else_case.discard { Value::null() } else { value })
            }
            None => Ok(Value::null()),
        }
    }

    // Break and continue stop at the loop, anything else goes through
    fn loop_body(&self, body: &ASTNode, discard: bool, ctx: &Rc<Context>) -> Result<Flow, Signal> {
        match self.evaluate(body, ctx) {
            Ok(value) => Ok(Flow::Next((!discard).then_some(value))),
            Err(Signal::Continue(_)) => Ok(Flow::Next(None)),
            Err(Signal::Break(_)) => Ok(Flow::Stop),
            Err(signal) => Err(signal),
        }
    }

    pub(super) fn eval_for(
        &self,
        var: &str,
        range: &ForRange,
        body: &ASTNode,
        discard: bool,
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let mut results = Vec::new();

        let outcome = match range {
            ForRange::Numeric { start, end, step } => {
                self.numeric_loop(var, start, end, step.as_deref(), body, discard, node, ctx, &mut results)
            }
            ForRange::Each { iterable } => {
                self.each_loop(var, iterable, body, discard, node, ctx, &mut results)
            }
        };

        // The loop variable does not outlive the loop
        ctx.symbols.borrow_mut().remove(var);
        outcome?;

        Ok(if discard { Value::null() } else { Value::new_list(results) })
    }

    #[allow(clippy::too_many_arguments)]
    fn numeric_loop(
        &self,
        var: &str,
        start: &ASTNode,
        end: &ASTNode,
        step: Option<&ASTNode>,
        body: &ASTNode,
        discard: bool,
        node: &ASTNode,
        ctx: &Rc<Context>,
        results: &mut Vec<Value>,
    ) -> Result<(), Signal> {
        let bound = |value: &Value| as_number(value).map_err(|e| self.error(e, &node.span, ctx));

        let mut current = bound(&self.evaluate(start, ctx)?)?;
        let end = Value::Number(bound(&self.evaluate(end, ctx)?)?);
        let step = match step {
            Some(step) => bound(&self.evaluate(step, ctx)?)?,
            None => Number::Int(1),
        };

        if !step.is_truthy() {
            return Err(self.error(InterpreterError::ZeroStep, &node.span, ctx));
        }

        // The sign of the step gives the direction
        let comparison = if step.as_f64() > 0. {
            BinaryOperator::Less
        } else {
            BinaryOperator::Greater
        };
        let step = Value::Number(step);

        loop {
            let counter = Value::Number(current);
            let keep_going = counter
                .binary_op(comparison, &end)
                .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))?;
            if !keep_going.is_truthy() {
                break;
            }

            ctx.declare(var, counter.clone());
            match self.loop_body(body, discard, ctx)? {
                Flow::Next(value) => results.extend(value),
                Flow::Stop => break,
            }

            current = match counter.binary_op(BinaryOperator::Add, &step) {
                Ok(Value::Number(n)) => n,
                Ok(_) => break,
                Err(e) => return Err(self.error(InterpreterError::from(e), &node.span, ctx)),
            };
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn each_loop(
        &self,
        var: &str,
        iterable: &ASTNode,
        body: &ASTNode,
        discard: bool,
        node: &ASTNode,
        ctx: &Rc<Context>,
        results: &mut Vec<Value>,
    ) -> Result<(), Signal> {
        let iterable = self.evaluate(iterable, ctx)?;

        if let Value::Class(class) = &iterable {
            let has_iterator = class.borrow().members.get_str("__iter__").is_some();
            if has_iterator {
                return self.iterator_loop(var, &iterable, body, discard, node, ctx, results);
            }
        }

        let items = iterable
            .items()
            .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))?;

        for item in items {
            ctx.declare(var, item);
            match self.loop_body(body, discard, ctx)? {
                Flow::Next(value) => results.extend(value),
                Flow::Stop => break,
            }
        }

        Ok(())
    }

    // `__iter__` is called once, then `__next__` on its result until StopIteration
    #[allow(clippy::too_many_arguments)]
    fn iterator_loop(
        &self,
        var: &str,
        object: &Value,
        body: &ASTNode,
        discard: bool,
        node: &ASTNode,
        ctx: &Rc<Context>,
        results: &mut Vec<Value>,
    ) -> Result<(), Signal> {
        let attr = |value: &Value, name: &str| {
            value
                .get_attr(name)
                .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))
        };

        let iter = attr(object, "__iter__")?;
        let iterator = self.call(&iter, vec![], &node.span, ctx)?;
        let next = attr(&iterator, "__next__")?;

        loop {
            let item = match self.call(&next, vec![], &node.span, ctx) {
                Ok(item) => item,
                Err(Signal::Error(e)) if e.kind == ErrorKind::StopIteration => break,
                Err(signal) => return Err(signal),
            };

            ctx.declare(var, item);
            match self.loop_body(body, discard, ctx)? {
                Flow::Next(value) => results.extend(value),
                Flow::Stop => break,
            }
        }

        Ok(())
    }

    pub(super) fn eval_while(&self, condition: &ASTNode, body: &ASTNode, ctx: &Rc<Context>) -> RuntimeResult {
        loop {
            if !self.evaluate(condition, ctx)?.is_truthy() {
                break;
            }

            if let Flow::Stop = self.loop_body(body, true, ctx)? {
                break;
            }
        }

        Ok(Value::null())
    }

    pub(super) fn eval_return(&self, value: Option<&ASTNode>, ctx: &Rc<Context>) -> RuntimeResult {
        let value = match value {
            Some(value) => self.evaluate(value, ctx)?,
            None => Value::null(),
        };

        Err(Signal::Return(value))
    }

    // Copies the captured value into the running frame
    pub(super) fn eval_nonlocal(&self, name: &str, node: &ASTNode, ctx: &Rc<Context>) -> RuntimeResult {
        let captured = ctx.nonlocals.borrow().get(name).cloned();

        match captured {
            Some(value) => {
                ctx.declare(name, value);
                Ok(Value::null())
            }
            None => Err(self.error(InterpreterError::NoNonlocalBinding(name.into()), &node.span, ctx)),
        }
    }

    pub(super) fn eval_defer(&self, expr: &Rc<ASTNode>, ctx: &Rc<Context>) -> RuntimeResult {
        ctx.deferred.borrow_mut().push(expr.clone());
        Ok(Value::null())
    }
}
