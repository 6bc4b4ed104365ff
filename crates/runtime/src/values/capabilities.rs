use frontend::ast::BinaryOperator;

use super::{OperationError, Value};

pub type OpResult = Result<Value, OperationError>;

// Each value kind implements only the operations it supports, the dispatch
// in `Value` reports an illegal operation for the others

pub trait Arithmetic {
    // +, -, *, / and ^
    fn arithmetic(&self, op: BinaryOperator, other: &Value) -> OpResult;
}

pub trait Comparable {
    // Ordering and logic operators. Equality is total and lives on `Value`
    fn compare(&self, op: BinaryOperator, other: &Value) -> OpResult;
}

pub trait Subscriptable {
    fn subscript(&self, index: &Value) -> OpResult;
}

pub trait IndexAssignable {
    fn assign_index(&mut self, index: &Value, value: Value) -> Result<(), OperationError>;
}

pub trait Attributable {
    fn get_attr(&self, name: &str) -> OpResult;
    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), OperationError>;
}

pub trait Iterable {
    // Snapshot of the items a for-loop walks through
    fn items(&self) -> Vec<Value>;
    fn length(&self) -> usize;
}

// Anything that binds call arguments to declared parameter names
pub trait Callable {
    fn name(&self) -> &str;
    fn params(&self) -> &[String];
}
