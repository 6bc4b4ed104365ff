use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use frontend::ast::ASTNode;
use tools::position::Position;

use crate::values::Value;

pub type SharedTable = Rc<RefCell<SymbolTable>>;

// Scope of names. Lookup falls back on the parent, writes stay local
#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Value>,
    parent: Option<SharedTable>,
}

impl SymbolTable {
    pub fn new(parent: Option<SharedTable>) -> Self {
        Self {
            symbols: HashMap::new(),
            parent,
        }
    }

    pub fn shared(parent: Option<SharedTable>) -> SharedTable {
        Rc::new(RefCell::new(Self::new(parent)))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.symbols.get(name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref().and_then(|p| p.borrow().get(name)),
        }
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.symbols.get(name).cloned()
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    // Shadows any binding of the same name in the ancestors
    pub fn set(&mut self, name: &str, value: Value) {
        self.symbols.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.symbols.remove(name)
    }

    pub fn parent(&self) -> Option<SharedTable> {
        self.parent.clone()
    }

    // Local names only, sorted to keep listings stable
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.symbols.keys().cloned().collect();
        names.sort();
        names
    }
}

// One call frame: a function call, a loaded module, the program itself
pub struct Context {
    pub label: String,
    pub parent: Option<Rc<Context>>,
    // Where the parent entered this frame
    pub entry: Option<Position>,
    pub symbols: SharedTable,
    // Top-level table of the module this frame runs in
    pub global: SharedTable,
    // Values captured by the running closure, read by `nonlocal`
    pub nonlocals: RefCell<HashMap<String, Value>>,
    // Expressions queued by `defer`, run when the frame returns
    pub deferred: RefCell<Vec<Rc<ASTNode>>>,
}

impl Context {
    // Frame of a program or module, its scope is the global table
    pub fn root(label: &str, global: SharedTable) -> Rc<Self> {
        Rc::new(Self {
            label: label.to_string(),
            parent: None,
            entry: None,
            symbols: global.clone(),
            global,
            nonlocals: RefCell::new(HashMap::new()),
            deferred: RefCell::new(Vec::new()),
        })
    }

    // Frame entered from `parent` at `entry`
    pub fn frame(
        label: &str,
        parent: &Rc<Context>,
        entry: Position,
        symbols: SharedTable,
        global: SharedTable,
    ) -> Rc<Self> {
        Rc::new(Self {
            label: label.to_string(),
            parent: Some(parent.clone()),
            entry: Some(entry),
            symbols,
            global,
            nonlocals: RefCell::new(HashMap::new()),
            deferred: RefCell::new(Vec::new()),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.symbols.borrow().get(name)
    }

    pub fn declare(&self, name: &str, value: Value) {
        self.symbols.borrow_mut().set(name, value);
    }

    // Frames from the innermost one, each with the position reached in it
    pub fn traceback(&self, pos: &Position) -> Vec<(String, Position)> {
        let mut frames = vec![(self.label.clone(), pos.clone())];
        let mut pos = self.entry.clone();
        let mut parent = self.parent.clone();

        while let (Some(ctx), Some(entry)) = (parent, pos) {
            frames.push((ctx.label.clone(), entry));
            pos = ctx.entry.clone();
            parent = ctx.parent.clone();
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Number;

    fn int(v: i64) -> Value {
        Value::Number(Number::Int(v))
    }

    #[test]
    fn lookup_walks_parents() {
        let global = SymbolTable::shared(None);
        global.borrow_mut().set("x", int(1));

        let local = SymbolTable::shared(Some(global.clone()));
        local.borrow_mut().set("y", int(2));

        assert_eq!(local.borrow().get("x"), Some(int(1)));
        assert_eq!(local.borrow().get("y"), Some(int(2)));
        assert_eq!(local.borrow().get("z"), None);
        assert_eq!(local.borrow().get_local("x"), None);
    }

    #[test]
    fn set_shadows_without_touching_ancestors() {
        let global = SymbolTable::shared(None);
        global.borrow_mut().set("x", int(1));

        let local = SymbolTable::shared(Some(global.clone()));
        local.borrow_mut().set("x", int(5));

        assert_eq!(local.borrow().get("x"), Some(int(5)));
        assert_eq!(global.borrow().get("x"), Some(int(1)));

        local.borrow_mut().remove("x");
        assert_eq!(local.borrow().get("x"), Some(int(1)));
    }

    #[test]
    fn names_are_local_and_sorted() {
        let global = SymbolTable::shared(None);
        global.borrow_mut().set("print", int(0));

        let mut table = SymbolTable::new(Some(global));
        table.set("b", int(0));
        table.set("a", int(0));

        assert_eq!(table.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn traceback_pairs_frames_with_entries() {
        let file: Rc<str> = Rc::from("main.yan");
        let mut call_site = Position::new(file.clone());
        call_site.line = 6;
        let mut error_pos = Position::new(file);
        error_pos.line = 2;

        let global = SymbolTable::shared(None);
        let program = Context::root("<program>", global.clone());
        let frame = Context::frame(
            "f",
            &program,
            call_site.clone(),
            SymbolTable::shared(Some(global.clone())),
            global,
        );

        let frames = frame.traceback(&error_pos);

        assert_eq!(
            frames,
            vec![("f".to_string(), error_pos), ("<program>".to_string(), call_site)]
        );
    }
}
