pub mod retention;
pub mod scout;
