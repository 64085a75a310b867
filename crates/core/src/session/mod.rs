//! A running interview: the pure state machine plus the task that drives it.

pub mod driver;
pub mod machine;

pub use driver::*;
pub use machine::*;
