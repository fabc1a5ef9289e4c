//! Top-level retry driver
//!
//! Runs independent attempts until one is accepted. An error inside an attempt
//! is logged and counted as a failed attempt; only console failures between
//! attempts propagate.

use crate::agent::{Agent, AgentOutcome};
use proofcraft_gateway::{Error, Gateway, Result};
use std::path::Path;

/// An accepted solution and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solved {
    /// 1-based attempt number
    pub run: usize,
    pub solution: String,
    /// Correction loop iterations the accepted attempt took
    pub iterations: u32,
}

pub struct Driver<G> {
    agent: Agent<G>,
    max_runs: usize,
}

impl<G: Gateway> Driver<G> {
    pub fn new(agent: Agent<G>, max_runs: usize) -> Self {
        Self { agent, max_runs }
    }

    pub fn agent(&self) -> &Agent<G> {
        &self.agent
    }

    /// Run attempts until one is accepted or `max_runs` is reached
    pub async fn solve(&self, problem_statement: &str, other_prompts: &[String]) -> Result<Option<Solved>> {
        let console = self.agent.console();

        for run in 1..=self.max_runs {
            console.line(format!(
                "\n\n>>>>>>>>>>>>>>>>>>>>>>>>>> Run {} of {} ...",
                run, self.max_runs
            ))?;

            match self.agent.run(problem_statement, other_prompts).await {
                Ok(AgentOutcome::Accepted { solution, iterations }) => {
                    console.line(format!(">>>>>>> Found a correct solution in run {}.", run))?;
                    tracing::info!(run, iterations, "solved");
                    return Ok(Some(Solved {
                        run,
                        solution,
                        iterations,
                    }));
                }
                Ok(AgentOutcome::Abandoned(reason)) => {
                    tracing::info!(run, %reason, "run ended without a solution");
                }
                Err(e) => {
                    tracing::error!(run, retryable = e.is_retryable(), error = ?e, "run failed");
                    console.line(format!(">>>>>>> Error in run {}: {}", run, e))?;
                }
            }
        }

        tracing::warn!(max_runs = self.max_runs, "no solution found");
        Ok(None)
    }
}

/// Read the problem statement from `path`
pub fn read_problem_statement(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map_err(|e| Error::io_at(path.display().to_string(), e))
        .map_err(|e| e.with_operation("driver::read_problem"))
}
