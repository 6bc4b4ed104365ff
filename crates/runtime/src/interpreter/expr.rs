use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use frontend::ast::{ASTNode, BinaryOperator, FunctionDefinition, NodeKind, NumberLiteral, UnaryOperator};

use super::{Interpreter, InterpreterError, RuntimeResult};
use crate::environment::Context;
use crate::values::{ClassObject, Dictionary, Function, Number, Value, CLASS_NAME_KEY};

impl Interpreter {
    pub(super) fn eval_literal(&self, node: &ASTNode) -> RuntimeResult {
        Ok(match &node.kind {
            NodeKind::Number(NumberLiteral::Int(v)) => Value::int(*v),
            NodeKind::Number(NumberLiteral::Float(v)) => Value::float(*v),
            NodeKind::String(s) => Value::string(s),
            _ => Value::null(),
        })
    }

    // Numbers and strings are immutable, so a clone is a copy.
    // Lists, dictionaries and objects come out shared
    pub(super) fn eval_var_access(&self, name: &str, node: &ASTNode, ctx: &Rc<Context>) -> RuntimeResult {
        ctx.lookup(name)
            .ok_or_else(|| self.error(InterpreterError::UndefinedVariable(name.into()), &node.span, ctx))
    }

    pub(super) fn eval_var_assign(&self, name: &str, value: &ASTNode, ctx: &Rc<Context>) -> RuntimeResult {
        let value = self.evaluate(value, ctx)?;
        ctx.declare(name, value.clone());

        Ok(value)
    }

    // Both operands are always evaluated, `and` and `or` included
    pub(super) fn eval_binary_op(
        &self,
        left: &ASTNode,
        operator: BinaryOperator,
        right: &ASTNode,
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let lhs = self.evaluate(left, ctx)?;
        let rhs = self.evaluate(right, ctx)?;

        lhs.binary_op(operator, &rhs)
            .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))
    }

    pub(super) fn eval_unary_op(
        &self,
        operator: UnaryOperator,
        operand: &ASTNode,
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let value = self.evaluate(operand, ctx)?;

        value
            .unary_op(operator)
            .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))
    }

    pub(super) fn eval_list(&self, elements: &[ASTNode], ctx: &Rc<Context>) -> RuntimeResult {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            values.push(self.evaluate(element, ctx)?);
        }

        Ok(Value::new_list(values))
    }

    // A `__cls__` key turns the dictionary into an object prototype
    pub(super) fn eval_dictionary(
        &self,
        entries: &[(ASTNode, ASTNode)],
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let mut dict = Dictionary::new();
        let mut is_class = false;

        for (key, value) in entries {
            let key = self.evaluate(key, ctx)?;
            if matches!(&key, Value::String(s) if &**s == CLASS_NAME_KEY) {
                is_class = true;
            }

            let value = self.evaluate(value, ctx)?;
            dict.insert(key, value);
        }

        if !is_class {
            return Ok(Value::new_dict(dict));
        }

        let class = ClassObject::build(dict)
            .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))?;

        Ok(Value::new_class(class))
    }

    // Value of each statement, in order
    pub(super) fn eval_block(&self, statements: &[ASTNode], ctx: &Rc<Context>) -> RuntimeResult {
        let mut values = Vec::with_capacity(statements.len());
        for statement in statements {
            values.push(self.evaluate(statement, ctx)?);
        }

        Ok(Value::new_list(values))
    }

    // Captures the free and cell variables visible from the defining frame
    pub(super) fn eval_function_def(&self, definition: &Rc<FunctionDefinition>, ctx: &Rc<Context>) -> RuntimeResult {
        let mut closure = HashMap::new();

        for name in definition.free_vars.iter().chain(definition.cell_vars.iter()) {
            let captured = ctx
                .lookup(name)
                .or_else(|| ctx.nonlocals.borrow().get(name).cloned());

            if let Some(value) = captured {
                closure.insert(name.clone(), value);
            }
        }

        let function = Function::new(definition.clone(), closure, ctx.global.clone());
        trace!(
            name = definition.name.as_deref().unwrap_or("<anonymous>"),
            captured = function.closure.len(),
            "function defined"
        );

        let value = Value::Function(Rc::new(function));
        if let Some(name) = &definition.name {
            ctx.declare(name, value.clone());
        }

        Ok(value)
    }

    pub(super) fn eval_call(
        &self,
        target: &ASTNode,
        args: &[ASTNode],
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let callee = self.evaluate(target, ctx)?;
        let args = self.eval_args(args, ctx)?;

        self.call(&callee, args, &node.span, ctx)
    }

    pub(super) fn eval_args(&self, args: &[ASTNode], ctx: &Rc<Context>) -> Result<Vec<Value>, super::Signal> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, ctx)?);
        }

        Ok(values)
    }

    // Reading gives the item, assigning mutates the container in place
    pub(super) fn eval_subscription(
        &self,
        target: &ASTNode,
        index: &ASTNode,
        value: Option<&ASTNode>,
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let container = self.evaluate(target, ctx)?;
        let index = self.evaluate(index, ctx)?;

        match value {
            Some(value) => {
                let value = self.evaluate(value, ctx)?;
                container
                    .assign_index(&index, value)
                    .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))?;

                Ok(Value::null())
            }
            None => container
                .subscript(&index)
                .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx)),
        }
    }

    pub(super) fn eval_attribution(
        &self,
        target: &ASTNode,
        attr: &str,
        value: Option<&ASTNode>,
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let object = self.evaluate(target, ctx)?;

        match value {
            Some(value) => {
                let value = self.evaluate(value, ctx)?;
                object
                    .set_attr(attr, value)
                    .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))?;

                Ok(Value::null())
            }
            None => object
                .get_attr(attr)
                .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx)),
        }
    }

    pub(super) fn eval_attribution_call(
        &self,
        target: &ASTNode,
        attr: &str,
        args: &[ASTNode],
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let object = self.evaluate(target, ctx)?;
        let callee = object
            .get_attr(attr)
            .map_err(|e| self.error(InterpreterError::from(e), &node.span, ctx))?;
        let args = self.eval_args(args, ctx)?;

        self.call(&callee, args, &node.span, ctx)
    }

    pub(super) fn eval_new(
        &self,
        prototype: &ASTNode,
        args: &[ASTNode],
        node: &ASTNode,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let prototype = self.evaluate(prototype, ctx)?;
        if !matches!(prototype, Value::Class(_)) {
            return Err(self.error(InterpreterError::NewRequiresPrototype, &node.span, ctx));
        }

        let args = self.eval_args(args, ctx)?;
        self.instantiate(&prototype, args, &node.span, ctx)
    }
}

// Numeric value of a for-loop bound
pub(super) fn as_number(value: &Value) -> Result<Number, InterpreterError> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(InterpreterError::ForBoundType(value.kind())),
    }
}
