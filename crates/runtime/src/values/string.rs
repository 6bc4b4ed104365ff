use std::rc::Rc;

use frontend::ast::BinaryOperator;

use super::capabilities::{Arithmetic, Iterable, OpResult, Subscriptable};
use super::{Number, OperationError, Value};

// Rendering of a string nested in a collection
pub fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');

    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }

    out.push('\'');
    out
}

// Upper bound in bytes of a string built by repetition
const MAX_REPEAT_LEN: usize = 1 << 28;

// A negative count gives an empty string
fn repeat(s: &str, times: i64) -> Result<String, OperationError> {
    if times <= 0 || s.is_empty() {
        return Ok(String::new());
    }

    match usize::try_from(times).ok().and_then(|t| s.len().checked_mul(t)) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(s.repeat(times as usize)),
        _ => Err(OperationError::StringTooLong(MAX_REPEAT_LEN)),
    }
}

impl Arithmetic for str {
    fn arithmetic(&self, op: BinaryOperator, other: &Value) -> OpResult {
        match (op, other) {
            (BinaryOperator::Add, Value::String(rhs)) => {
                Ok(Value::String(Rc::from(format!("{}{}", self, rhs))))
            }
            (BinaryOperator::Mul, Value::Number(Number::Int(times))) => {
                Ok(Value::String(Rc::from(repeat(self, *times)?)))
            }
            (BinaryOperator::Mul, Value::Number(Number::Float(_))) => {
                Err(OperationError::StringRepeatNotInteger)
            }
            _ => Err(OperationError::illegal(op, "String", other.kind())),
        }
    }
}

// Indexes count code points, not bytes
impl Subscriptable for str {
    fn subscript(&self, index: &Value) -> OpResult {
        let idx = match index {
            Value::Number(Number::Int(i)) if *i >= 0 => *i,
            Value::Number(n) => return Err(OperationError::StringIndexInvalid(n.to_string())),
            _ => return Err(OperationError::StringIndexType(index.kind())),
        };

        match self.chars().nth(idx as usize) {
            Some(c) => Ok(Value::String(Rc::from(c.to_string()))),
            None => Err(OperationError::StringIndexOutOfRange {
                max: self.chars().count() as i64 - 1,
                got: idx,
            }),
        }
    }
}

impl Iterable for str {
    fn items(&self) -> Vec<Value> {
        self.chars()
            .map(|c| Value::String(Rc::from(c.to_string())))
            .collect()
    }

    fn length(&self) -> usize {
        self.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Value {
        Value::String(Rc::from(s))
    }

    #[test]
    fn concat_and_repeat() {
        assert_eq!("ab".arithmetic(BinaryOperator::Add, &string("cd")), Ok(string("abcd")));
        assert_eq!(
            "ab".arithmetic(BinaryOperator::Mul, &Value::Number(Number::Int(3))),
            Ok(string("ababab"))
        );
        assert_eq!(
            "ab".arithmetic(BinaryOperator::Mul, &Value::Number(Number::Int(-1))),
            Ok(string(""))
        );
        assert_eq!(
            "ab".arithmetic(BinaryOperator::Mul, &Value::Number(Number::Float(2.))),
            Err(OperationError::StringRepeatNotInteger)
        );
        assert_eq!(
            "ab".arithmetic(BinaryOperator::Sub, &string("b")),
            Err(OperationError::illegal("-", "String", "String"))
        );
    }

    #[test]
    fn index_by_code_point() {
        let s = "héllo";

        assert_eq!(s.length(), 5);
        assert_eq!(s.subscript(&Value::Number(Number::Int(1))), Ok(string("é")));
        assert_eq!(s.subscript(&Value::Number(Number::Int(4))), Ok(string("o")));
        assert_eq!(
            s.subscript(&Value::Number(Number::Int(5))),
            Err(OperationError::StringIndexOutOfRange { max: 4, got: 5 })
        );
    }

    #[test]
    fn invalid_indexes() {
        assert_eq!(
            "abc".subscript(&Value::Number(Number::Int(-1))),
            Err(OperationError::StringIndexInvalid("-1".into()))
        );
        assert_eq!(
            "abc".subscript(&Value::Number(Number::Float(1.5))),
            Err(OperationError::StringIndexInvalid("1.5".into()))
        );
        assert_eq!(
            "abc".subscript(&string("a")),
            Err(OperationError::StringIndexType("String"))
        );
    }

    #[test]
    fn iterate_code_points() {
        assert_eq!("añ".items(), vec![string("a"), string("ñ")]);
    }

    #[test]
    fn quoting() {
        assert_eq!(quoted("it's"), "'it\\'s'");
        assert_eq!(quoted("a\nb"), "'a\\nb'");
    }
}
