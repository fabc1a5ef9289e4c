//! # proofcraft agent
//!
//! The solve / verify / correct loop:
//! 1. Bootstrap: draft a solution, ask the model to improve it, check that it
//!    claims completeness, verify it
//! 2. Correct: while the verdict fails, send the bug report back and verify
//!    the corrected solution
//! 3. Accept after enough consecutive passing verifications, abandon after
//!    too many consecutive failures or when the iteration cap is hit
//! 4. The driver repeats whole attempts until one is accepted
//!
//! The model is only reached through the `Gateway` trait; every call is
//! awaited before the next one is made.

mod agent;
mod checks;
mod driver;
mod explore;
pub mod extract;
mod prompts;

#[cfg(test)]
mod test_support;

pub use agent::{AbandonReason, Agent, AgentConfig, AgentOutcome, LoopState};
pub use checks::VerificationOutcome;
pub use driver::{read_problem_statement, Driver, Solved};
pub use explore::Exploration;
pub use prompts::Prompts;
