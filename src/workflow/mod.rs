//! Letter workflow: validation, day counting, the status transition table
//! and the balance adjustments each transition implies.

pub mod policy;
pub mod service;
pub mod transition;

#[cfg(test)]
mod tests;

pub use policy::LetterPolicy;
pub use service::{CreatePlan, LetterContent, LetterInput, LetterWorkflow, Transition};
pub use transition::LetterAction;
