use frontend::ast::BinaryOperator;

use super::capabilities::{Arithmetic, IndexAssignable, Iterable, OpResult, Subscriptable};
use super::{Number, OperationError, Value};

// Position designated by `index`, negative indexes count from the end
pub fn resolve_index(len: usize, index: &Value) -> Result<usize, OperationError> {
    match index {
        Value::Number(Number::Int(i)) => {
            let len = len as i64;
            let resolved = if *i < 0 { i + len } else { *i };

            if resolved < 0 || resolved >= len {
                return Err(OperationError::ListIndexOutOfRange {
                    given: *i,
                    max: len - 1,
                });
            }

            Ok(resolved as usize)
        }
        Value::Number(Number::Float(_)) => Err(OperationError::ListIndexNotInteger),
        _ => Err(OperationError::ListIndexType(index.kind())),
    }
}

// Operators never touch the list itself, they work on a copy
impl Arithmetic for Vec<Value> {
    fn arithmetic(&self, op: BinaryOperator, other: &Value) -> OpResult {
        match (op, other) {
            (BinaryOperator::Add, _) => {
                let mut copy = self.clone();
                copy.push(other.clone());
                Ok(Value::new_list(copy))
            }
            (BinaryOperator::Mul, Value::List(rhs)) => {
                let mut copy = self.clone();
                copy.extend(rhs.borrow().iter().cloned());
                Ok(Value::new_list(copy))
            }
            (BinaryOperator::Sub, Value::Number(_)) => {
                let idx = resolve_index(self.len(), other)?;
                let mut copy = self.clone();
                copy.remove(idx);
                Ok(Value::new_list(copy))
            }
            (BinaryOperator::Div, Value::Number(_)) => self.subscript(other),
            _ => Err(OperationError::illegal(op, "List", other.kind())),
        }
    }
}

impl Subscriptable for Vec<Value> {
    fn subscript(&self, index: &Value) -> OpResult {
        let idx = resolve_index(self.len(), index)?;
        Ok(self[idx].clone())
    }
}

impl IndexAssignable for Vec<Value> {
    fn assign_index(&mut self, index: &Value, value: Value) -> Result<(), OperationError> {
        let idx = resolve_index(self.len(), index)?;
        self[idx] = value;
        Ok(())
    }
}

impl Iterable for Vec<Value> {
    fn items(&self) -> Vec<Value> {
        self.clone()
    }

    fn length(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Value {
        Value::Number(Number::Int(v))
    }

    fn list(values: Vec<i64>) -> Vec<Value> {
        values.into_iter().map(int).collect()
    }

    #[test]
    fn append_returns_a_copy() {
        let original = list(vec![1, 2, 3]);
        let appended = original.arithmetic(BinaryOperator::Add, &int(4)).unwrap();

        assert_eq!(appended, Value::new_list(list(vec![1, 2, 3, 4])));
        assert_eq!(original, list(vec![1, 2, 3]));
    }

    #[test]
    fn concat_and_remove() {
        let a = list(vec![1, 2]);
        let b = Value::new_list(list(vec![3]));

        assert_eq!(
            a.arithmetic(BinaryOperator::Mul, &b),
            Ok(Value::new_list(list(vec![1, 2, 3])))
        );
        assert_eq!(
            a.arithmetic(BinaryOperator::Sub, &int(0)),
            Ok(Value::new_list(list(vec![2])))
        );
        assert_eq!(
            a.arithmetic(BinaryOperator::Sub, &int(-1)),
            Ok(Value::new_list(list(vec![1])))
        );
    }

    #[test]
    fn read_with_wraparound() {
        let l = list(vec![10, 20, 30]);

        assert_eq!(l.subscript(&int(0)), Ok(int(10)));
        assert_eq!(l.subscript(&int(-1)), Ok(int(30)));
        assert_eq!(l.arithmetic(BinaryOperator::Div, &int(1)), Ok(int(20)));
    }

    #[test]
    fn index_errors() {
        let l = list(vec![10, 20, 30]);

        assert_eq!(
            l.subscript(&int(3)),
            Err(OperationError::ListIndexOutOfRange { given: 3, max: 2 })
        );
        assert_eq!(
            l.subscript(&int(-4)),
            Err(OperationError::ListIndexOutOfRange { given: -4, max: 2 })
        );
        assert_eq!(
            l.subscript(&Value::Number(Number::Float(1.))),
            Err(OperationError::ListIndexNotInteger)
        );
        assert_eq!(
            Vec::<Value>::new().subscript(&int(0)),
            Err(OperationError::ListIndexOutOfRange { given: 0, max: -1 })
        );
    }

    #[test]
    fn assign_in_place() {
        let mut l = list(vec![1, 2, 3]);
        l.assign_index(&int(0), int(9)).unwrap();

        assert_eq!(l, list(vec![9, 2, 3]));
    }
}
