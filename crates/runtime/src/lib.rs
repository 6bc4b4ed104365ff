pub mod config;
pub mod environment;
pub mod interpreter;
pub mod native_functions;
pub mod values;

extern crate frontend;
extern crate tools;

pub use config::Config;
pub use environment::{Context, SymbolTable};
pub use interpreter::{Exception, Interpreter};
pub use values::Value;
