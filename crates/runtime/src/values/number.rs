use std::fmt::Display;

use frontend::ast::BinaryOperator;

use super::capabilities::{Arithmetic, Comparable, OpResult};
use super::{OperationError, Value};

// Integer arithmetic stays exact until a float is involved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub const NULL: Number = Number::Int(0);

    pub fn from_bool(b: bool) -> Self {
        Number::Int(b as i64)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float(v) => *v,
        }
    }

    pub fn is_truthy(&self) -> bool {
        self.as_f64() != 0.
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    // Int and Float compare by value: 2 == 2.0
    pub fn equals(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }

    pub fn negate(&self) -> Result<Number, OperationError> {
        match self {
            Number::Int(v) => v
                .checked_neg()
                .map(Number::Int)
                .ok_or(OperationError::IntegerOverflow),
            Number::Float(v) => Ok(Number::Float(-v)),
        }
    }

    fn checked(
        &self,
        rhs: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Number, OperationError> {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => int_op(*a, b)
                .map(Number::Int)
                .ok_or(OperationError::IntegerOverflow),
            _ => Ok(Number::Float(float_op(self.as_f64(), rhs.as_f64()))),
        }
    }

    // Integer division truncates toward zero
    fn divide(&self, rhs: Number) -> Result<Number, OperationError> {
        if rhs.as_f64() == 0. {
            return Err(OperationError::DivisionByZero);
        }

        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_div(b)
                .map(Number::Int)
                .ok_or(OperationError::IntegerOverflow),
            _ => Ok(Number::Float(self.as_f64() / rhs.as_f64())),
        }
    }

    fn operand(op: BinaryOperator, other: &Value) -> Result<Number, OperationError> {
        match other {
            Value::Number(n) => Ok(*n),
            _ => Err(OperationError::illegal(op, "Number", other.kind())),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

impl Arithmetic for Number {
    fn arithmetic(&self, op: BinaryOperator, other: &Value) -> OpResult {
        let rhs = Number::operand(op, other)?;

        let result = match op {
            BinaryOperator::Add => self.checked(rhs, i64::checked_add, |a, b| a + b)?,
            BinaryOperator::Sub => self.checked(rhs, i64::checked_sub, |a, b| a - b)?,
            BinaryOperator::Mul => self.checked(rhs, i64::checked_mul, |a, b| a * b)?,
            BinaryOperator::Div => self.divide(rhs)?,
            // Always a float, even between integers
            BinaryOperator::Pow => Number::Float(self.as_f64().powf(rhs.as_f64())),
            _ => return Err(OperationError::illegal(op, "Number", other.kind())),
        };

        Ok(Value::Number(result))
    }
}

impl Comparable for Number {
    fn compare(&self, op: BinaryOperator, other: &Value) -> OpResult {
        let rhs = Number::operand(op, other)?;
        let (a, b) = (self.as_f64(), rhs.as_f64());

        let result = match (op, self, rhs) {
            (BinaryOperator::Less, Number::Int(x), Number::Int(y)) => *x < y,
            (BinaryOperator::Greater, Number::Int(x), Number::Int(y)) => *x > y,
            (BinaryOperator::LessEqual, Number::Int(x), Number::Int(y)) => *x <= y,
            (BinaryOperator::GreaterEqual, Number::Int(x), Number::Int(y)) => *x >= y,
            (BinaryOperator::Less, ..) => a < b,
            (BinaryOperator::Greater, ..) => a > b,
            (BinaryOperator::LessEqual, ..) => a <= b,
            (BinaryOperator::GreaterEqual, ..) => a >= b,
            (BinaryOperator::And, ..) => self.is_truthy() && rhs.is_truthy(),
            (BinaryOperator::Or, ..) => self.is_truthy() || rhs.is_truthy(),
            _ => return Err(OperationError::illegal(op, "Number", other.kind())),
        };

        Ok(Value::Number(Number::from_bool(result)))
    }
}
