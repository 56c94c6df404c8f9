//! Arcana compiler backend: Python code generation

pub mod codegen;
pub mod py_emitter;

pub use codegen::transpile;
pub use py_emitter::PyEmitter;
