pub mod ast;
pub mod builtin;
pub mod cursor;
pub mod env;
pub mod eval;
pub mod foreign;
pub mod parser;
pub mod value;
