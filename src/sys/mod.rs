pub mod decoder;
pub mod runtime;
