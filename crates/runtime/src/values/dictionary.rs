use super::capabilities::{Attributable, IndexAssignable, Iterable, OpResult, Subscriptable};
use super::{OperationError, Value};

pub const CLASS_NAME_KEY: &str = "__cls__";
pub const CONSTRUCTOR_KEY: &str = "__init__";

// Keys are matched with value equality, in insertion order
#[derive(Clone, Default)]
pub struct Dictionary {
    entries: Vec<(Value, Value)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.equals(key))
            .map(|(_, v)| v.clone())
    }

    pub fn get_str(&self, key: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::String(s) if &**s == key))
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.iter().any(|(k, _)| k.equals(key))
    }

    // Replaces the value of an existing key, appends otherwise
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k.equals(&key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k.equals(key))?;
        Some(self.entries.remove(idx).1)
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Subscriptable for Dictionary {
    fn subscript(&self, index: &Value) -> OpResult {
        self.get(index)
            .ok_or_else(|| OperationError::MissingKey(index.to_string()))
    }
}

impl IndexAssignable for Dictionary {
    // Only strings and numbers can become new keys
    fn assign_index(&mut self, index: &Value, value: Value) -> Result<(), OperationError> {
        if !self.contains_key(index) && !matches!(index, Value::String(_) | Value::Number(_)) {
            return Err(OperationError::InvalidKeyType);
        }

        self.insert(index.clone(), value);
        Ok(())
    }
}

impl Attributable for Dictionary {
    fn get_attr(&self, name: &str) -> OpResult {
        self.get_str(name)
            .ok_or_else(|| OperationError::MissingKey(name.to_string()))
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), OperationError> {
        self.insert(Value::String(name.into()), value);
        Ok(())
    }
}

impl Iterable for Dictionary {
    fn items(&self) -> Vec<Value> {
        self.keys()
    }

    fn length(&self) -> usize {
        self.len()
    }
}

// Dictionary used as an object prototype, or an instance built from one
#[derive(Clone)]
pub struct ClassObject {
    pub class_name: String,
    pub is_proto: bool,
    pub members: Dictionary,
}

impl ClassObject {
    // The members must name the class through `__cls__`
    pub fn build(members: Dictionary) -> Result<Self, OperationError> {
        let class_name = match members.get_str(CLASS_NAME_KEY) {
            Some(Value::String(name)) => name.to_string(),
            Some(other) => return Err(OperationError::ClassNameType(other.kind())),
            None => return Err(OperationError::MissingKey(CLASS_NAME_KEY.into())),
        };

        Ok(Self {
            class_name,
            is_proto: true,
            members,
        })
    }

    // Shallow copy of the prototype, members are shared
    pub fn instance(&self) -> Self {
        Self {
            class_name: self.class_name.clone(),
            is_proto: false,
            members: self.members.clone(),
        }
    }

    pub fn constructor(&self) -> Option<Value> {
        self.members.get_str(CONSTRUCTOR_KEY)
    }
}

impl Subscriptable for ClassObject {
    fn subscript(&self, index: &Value) -> OpResult {
        self.members.subscript(index)
    }
}

impl IndexAssignable for ClassObject {
    fn assign_index(&mut self, index: &Value, value: Value) -> Result<(), OperationError> {
        self.members.assign_index(index, value)
    }
}

impl Attributable for ClassObject {
    fn get_attr(&self, name: &str) -> OpResult {
        self.members
            .get_str(name)
            .ok_or_else(|| OperationError::MissingMember {
                class: self.class_name.clone(),
                attr: name.to_string(),
            })
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), OperationError> {
        self.members.set_attr(name, value)
    }
}

impl Iterable for ClassObject {
    fn items(&self) -> Vec<Value> {
        self.members.keys()
    }

    fn length(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Number;

    fn string(s: &str) -> Value {
        Value::String(s.into())
    }

    fn int(v: i64) -> Value {
        Value::Number(Number::Int(v))
    }

    #[test]
    fn keys_compare_by_value() {
        let mut d = Dictionary::new();
        d.insert(int(1), string("one"));
        d.insert(Value::Number(Number::Float(1.)), string("uno"));
        d.insert(string("k"), int(2));

        assert_eq!(d.len(), 2);
        assert_eq!(d.get(&int(1)), Some(string("uno")));
        assert_eq!(d.keys(), vec![int(1), string("k")]);
    }

    #[test]
    fn missing_key() {
        let d = Dictionary::new();

        assert_eq!(
            d.subscript(&string("name")),
            Err(OperationError::MissingKey("name".into()))
        );
        assert_eq!(
            d.get_attr("name").unwrap_err().to_string(),
            "Dictionary has no attribute `name`"
        );
    }

    #[test]
    fn new_keys_must_be_strings_or_numbers() {
        let mut d = Dictionary::new();

        assert_eq!(d.assign_index(&int(3), int(1)), Ok(()));
        assert_eq!(
            d.assign_index(&Value::new_list(vec![]), int(1)),
            Err(OperationError::InvalidKeyType)
        );
    }

    #[test]
    fn build_class() {
        let mut members = Dictionary::new();
        members.insert(string("__cls__"), string("Point"));
        members.insert(string("x"), int(0));

        let proto = ClassObject::build(members).unwrap();
        assert_eq!(proto.class_name, "Point");
        assert!(proto.is_proto);
        assert!(proto.constructor().is_none());

        let instance = proto.instance();
        assert!(!instance.is_proto);
        assert_eq!(instance.get_attr("x"), Ok(int(0)));
        assert_eq!(
            instance.get_attr("y"),
            Err(OperationError::MissingMember {
                class: "Point".into(),
                attr: "y".into()
            })
        );
    }

    #[test]
    fn class_name_must_be_a_string() {
        let mut members = Dictionary::new();
        members.insert(string("__cls__"), int(1));

        assert!(matches!(
            ClassObject::build(members),
            Err(OperationError::ClassNameType("Number"))
        ));
    }
}
