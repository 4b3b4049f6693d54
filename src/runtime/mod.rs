pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod native;
pub mod value;

pub use interpreter::Interpreter;
