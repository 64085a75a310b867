pub mod evaluate_answer;
pub mod worker;

pub use evaluate_answer::*;
pub use worker::*;
