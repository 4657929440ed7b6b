// While many parts of the compiler are in heavy development,
// there are lots of placeholders and code that will possibly be used, but isn't atm.
#![allow(dead_code, unused_macros, unused_variables)]

pub mod ast;
pub mod bignum;
pub mod diagnostics;
pub mod driver;
pub mod interned_path;
pub mod lexer;
pub mod logging;
pub mod module_set;
pub mod parser;
pub mod resolve;
pub mod settings;
pub mod string_interning;
pub mod symbol;
pub mod token;
pub mod topo;
pub mod typeck;
pub mod types;
