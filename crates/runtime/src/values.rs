use std::cell::RefCell;
use std::fmt::{Debug, Display};
use std::rc::Rc;

mod capabilities;
mod dictionary;
mod function;
mod list;
mod number;
mod string;
mod value_errors;

pub use capabilities::{
    Arithmetic, Attributable, Callable, Comparable, IndexAssignable, Iterable, OpResult,
    Subscriptable,
};
pub use dictionary::{ClassObject, Dictionary, CLASS_NAME_KEY, CONSTRUCTOR_KEY};
pub use function::{
    param_kind, variadic_name, BuiltinFunction, BuiltinMethod, Function, Method, NativeFn,
    ParamKind, ANONYMOUS,
};
pub use list::resolve_index;
pub use number::Number;
pub use string::quoted;
pub use value_errors::OperationError;

use frontend::ast::{BinaryOperator, UnaryOperator};

// Numbers and strings behave as copies, the other kinds are shared
#[derive(Clone)]
pub enum Value {
    Number(Number),
    String(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dictionary>>),
    Function(Rc<Function>),
    Method(Rc<Method>),
    Class(Rc<RefCell<ClassObject>>),
    Builtin(Rc<BuiltinFunction>),
    BuiltinMethod(Rc<BuiltinMethod>),
    // Arguments spliced into a variadic parameter
    Pack(Rc<Vec<Value>>),
}

impl Value {
    pub fn null() -> Self {
        Value::Number(Number::NULL)
    }

    pub fn int(v: i64) -> Self {
        Value::Number(Number::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }

    pub fn bool(b: bool) -> Self {
        Value::Number(Number::from_bool(b))
    }

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn new_list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(values)))
    }

    pub fn new_dict(dict: Dictionary) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    pub fn new_class(class: ClassObject) -> Self {
        Value::Class(Rc::new(RefCell::new(class)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Dict(_) => "Dictionary",
            Value::Function(_) => "Function",
            Value::Method(_) => "Method",
            Value::Class(_) => "ClassObject",
            Value::Builtin(_) => "BuiltinFunction",
            Value::BuiltinMethod(_) => "BuiltinMethod",
            Value::Pack(_) => "Pack",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => n.is_truthy(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::Method(_)
                | Value::Builtin(_)
                | Value::BuiltinMethod(_)
                | Value::Class(_)
        )
    }

    // Total equality: values of different kinds are never equal,
    // lists and dictionaries compare by content
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.equals(b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                // A container being mutated is never equal to another one
                let (Ok(a), Ok(b)) = (a.try_borrow(), b.try_borrow()) else {
                    return false;
                };
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (Ok(a), Ok(b)) = (a.try_borrow(), b.try_borrow()) else {
                    return false;
                };
                a.len() == b.len()
                    && a.entries()
                        .iter()
                        .all(|(k, v)| b.get(k).map_or(false, |w| v.equals(&w)))
            }
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::BuiltinMethod(a), Value::BuiltinMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Pack(a), Value::Pack(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    // Rendering inside a collection: strings are quoted
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => quoted(s),
            _ => self.to_string(),
        }
    }

    pub fn binary_op(&self, op: BinaryOperator, other: &Value) -> OpResult {
        match op {
            BinaryOperator::Equal => Ok(Value::bool(self.equals(other))),
            BinaryOperator::NotEqual => Ok(Value::bool(!self.equals(other))),
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Pow => match self {
                Value::Number(n) => n.arithmetic(op, other),
                Value::String(s) => s.arithmetic(op, other),
                Value::List(l) => l.borrow().arithmetic(op, other),
                _ => Err(OperationError::illegal(op, self.kind(), other.kind())),
            },
            _ => match self {
                Value::Number(n) => n.compare(op, other),
                _ => Err(OperationError::illegal(op, self.kind(), other.kind())),
            },
        }
    }

    pub fn unary_op(&self, op: UnaryOperator) -> OpResult {
        match (op, self) {
            (UnaryOperator::Plus, Value::Number(n)) => Ok(Value::Number(*n)),
            (UnaryOperator::Minus, Value::Number(n)) => Ok(Value::Number(n.negate()?)),
            (UnaryOperator::Not, Value::Number(n)) => Ok(Value::bool(!n.is_truthy())),
            _ => {
                let symbol = match op {
                    UnaryOperator::Plus => "+",
                    UnaryOperator::Minus => "-",
                    UnaryOperator::Not => "not",
                };
                Err(OperationError::illegal(symbol, self.kind(), self.kind()))
            }
        }
    }

    pub fn subscript(&self, index: &Value) -> OpResult {
        match self {
            Value::String(s) => s.subscript(index),
            Value::List(l) => l.borrow().subscript(index),
            Value::Dict(d) => d.borrow().subscript(index),
            Value::Class(c) => c.borrow().subscript(index),
            _ => Err(OperationError::NotSubscriptable(self.kind())),
        }
    }

    // Mutates the container in place
    pub fn assign_index(&self, index: &Value, value: Value) -> Result<(), OperationError> {
        match self {
            Value::List(l) => l.borrow_mut().assign_index(index, value),
            Value::Dict(d) => d.borrow_mut().assign_index(index, value),
            Value::Class(c) => c.borrow_mut().assign_index(index, value),
            _ => Err(OperationError::NotIndexAssignable(self.kind())),
        }
    }

    // Functions of an object taking `self` or `this` first come out bound to it
    pub fn get_attr(&self, name: &str) -> OpResult {
        match self {
            Value::Dict(d) => d.borrow().get_attr(name),
            Value::Class(c) => {
                let attr = c.borrow().get_attr(name)?;
                Ok(attr.bind_if_method(self))
            }
            _ => Err(OperationError::NoAttribute(self.kind())),
        }
    }

    pub fn set_attr(&self, name: &str, value: Value) -> Result<(), OperationError> {
        match self {
            Value::Dict(d) => d.borrow_mut().set_attr(name, value),
            Value::Class(c) => c.borrow_mut().set_attr(name, value),
            _ => Err(OperationError::NoAttributeAssign(self.kind())),
        }
    }

    pub fn items(&self) -> Result<Vec<Value>, OperationError> {
        match self {
            Value::String(s) => Ok(s.items()),
            Value::List(l) => Ok(l.borrow().items()),
            Value::Dict(d) => Ok(d.borrow().items()),
            Value::Class(c) => Ok(c.borrow().items()),
            _ => Err(OperationError::NotIterable(self.kind())),
        }
    }

    pub fn length(&self) -> Result<usize, OperationError> {
        match self {
            Value::String(s) => Ok(s.length()),
            Value::List(l) => Ok(l.borrow().length()),
            Value::Dict(d) => Ok(d.borrow().length()),
            Value::Class(c) => Ok(c.borrow().length()),
            _ => Err(OperationError::NoLength(self.kind())),
        }
    }

    pub fn bind_if_method(self, receiver: &Value) -> Value {
        match self {
            Value::Function(func) if func.is_method() => Value::Method(Rc::new(Method {
                func,
                receiver: receiver.clone(),
            })),
            _ => self,
        }
    }

    // Name shown in `<... of object 'X'>` renders
    fn owner_name(&self) -> String {
        match self {
            Value::Class(c) => c.borrow().class_name.clone(),
            _ => self.kind().to_string(),
        }
    }
}

fn is_hidden_member(key: &Value) -> bool {
    matches!(key, Value::String(s) if s.starts_with("__") && s.ends_with("__"))
}

thread_local! {
    // Containers whose rendering is in progress
    static RENDERING: RefCell<Vec<*const ()>> = const { RefCell::new(Vec::new()) };
}

// A container reached again while rendering itself prints as `cycle`
fn rendering(
    f: &mut std::fmt::Formatter<'_>,
    ptr: *const (),
    cycle: &str,
    render: impl FnOnce(&mut std::fmt::Formatter<'_>) -> std::fmt::Result,
) -> std::fmt::Result {
    let entered = RENDERING.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&ptr) {
            return false;
        }
        stack.push(ptr);
        true
    });
    if !entered {
        return write!(f, "{}", cycle);
    }

    let result = render(f);
    RENDERING.with(|stack| stack.borrow_mut().pop());

    result
}

fn write_entries<'a>(
    f: &mut std::fmt::Formatter<'_>,
    entries: impl Iterator<Item = &'a (Value, Value)>,
) -> std::fmt::Result {
    let rendered: Vec<String> = entries
        .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
        .collect();

    write!(f, "{{{}}}", rendered.join(", "))
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(l) => rendering(f, Rc::as_ptr(l) as *const (), "[...]", |f| {
                let rendered: Vec<String> = l.borrow().iter().map(|v| v.repr()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }),
            Value::Dict(d) => rendering(f, Rc::as_ptr(d) as *const (), "{...}", |f| {
                write_entries(f, d.borrow().entries().iter())
            }),
            Value::Function(func) => {
                write!(f, "<function {} at {:p}>", func.name(), Rc::as_ptr(func))
            }
            Value::Method(m) => write!(
                f,
                "<bound-method {} at {:p} of object '{}'>",
                m.func.name(),
                Rc::as_ptr(&m.func),
                m.receiver.owner_name()
            ),
            Value::Class(c) => {
                let class = c.borrow();
                if class.is_proto {
                    write!(f, "<Prototype of object '{}'>", class.class_name)
                } else {
                    write!(f, "{} ", class.class_name)?;
                    rendering(f, Rc::as_ptr(c) as *const (), "{...}", |f| {
                        write_entries(
                            f,
                            class.members.entries().iter().filter(|(k, _)| !is_hidden_member(k)),
                        )
                    })
                }
            }
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name),
            Value::BuiltinMethod(m) => write!(
                f,
                "<built-in method {} of object '{}'>",
                m.func.name,
                m.receiver.owner_name()
            ),
            Value::Pack(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.repr()).collect();
                write!(f, "<pack [{}]>", rendered.join(", "))
            }
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.repr())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_truthiness() {
        assert_eq!(Value::null().kind(), "Number");
        assert_eq!(Value::new_dict(Dictionary::new()).kind(), "Dictionary");
        assert!(!Value::null().is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("a").is_truthy());
        assert!(Value::new_list(vec![]).is_truthy());
    }

    #[test]
    fn equality_is_total_and_structural() {
        let a = Value::new_list(vec![Value::int(1), Value::string("x")]);
        let b = Value::new_list(vec![Value::int(1), Value::string("x")]);

        assert!(a.equals(&b));
        assert!(!a.equals(&Value::int(1)));
        assert_eq!(
            Value::string("1").binary_op(BinaryOperator::Equal, &Value::int(1)),
            Ok(Value::int(0))
        );
        assert_eq!(
            Value::int(2).binary_op(BinaryOperator::NotEqual, &Value::float(2.)),
            Ok(Value::int(0))
        );
    }

    #[test]
    fn lists_share_their_content() {
        let a = Value::new_list(vec![Value::int(1)]);
        let alias = a.clone();

        a.assign_index(&Value::int(0), Value::int(5)).unwrap();

        assert_eq!(alias.subscript(&Value::int(0)), Ok(Value::int(5)));
    }

    #[test]
    fn illegal_operations() {
        let f = Value::new_dict(Dictionary::new());

        assert_eq!(
            f.binary_op(BinaryOperator::Add, &Value::int(1))
                .unwrap_err()
                .to_string(),
            "Illegal operation '+' between 'Dictionary' and 'Number'"
        );
        assert_eq!(
            Value::string("a").unary_op(UnaryOperator::Not).unwrap_err().to_string(),
            "Illegal operation 'not' between 'String' and 'String'"
        );
        assert_eq!(
            Value::string("a").binary_op(BinaryOperator::Less, &Value::string("b")),
            Err(OperationError::illegal("<", "String", "String"))
        );
        assert_eq!(
            Value::int(1).subscript(&Value::int(0)),
            Err(OperationError::NotSubscriptable("Number"))
        );
    }

    #[test]
    fn display() {
        let mut d = Dictionary::new();
        d.insert(Value::string("k"), Value::new_list(vec![Value::int(1), Value::string("a")]));

        assert_eq!(Value::float(2.).to_string(), "2");
        assert_eq!(Value::string("it's").to_string(), "it's");
        assert_eq!(Value::new_dict(d).to_string(), "{'k': [1, 'a']}");
    }

    #[test]
    fn display_objects() {
        let mut members = Dictionary::new();
        members.insert(Value::string("__cls__"), Value::string("Point"));
        members.insert(Value::string("x"), Value::int(1));
        let proto = ClassObject::build(members).unwrap();
        let instance = proto.instance();

        assert_eq!(Value::new_class(proto).to_string(), "<Prototype of object 'Point'>");
        assert_eq!(Value::new_class(instance).to_string(), "Point {'x': 1}");
    }
}
