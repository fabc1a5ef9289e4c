//! Yes/no checks run against a candidate solution
//!
//! Both checks are conservative: when the gateway returns nothing the
//! solution is treated as incomplete or unverified.

use crate::agent::Agent;
use crate::extract::{detailed_solution, says_yes, text_before, DETAILED_VERIFICATION};
use proofcraft_gateway::{Conversation, Gateway, Result};

const RULE: &str = "======================================================================";

/// Critique of a solution plus the model's yes/no reading of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// Findings before the verification log; empty unless the verdict failed
    pub bug_report: String,
    /// Free text, read as a pass when it contains "yes"
    pub verdict: String,
}

impl VerificationOutcome {
    /// Outcome used whenever a verification call fails
    pub fn unverified() -> Self {
        Self {
            bug_report: String::new(),
            verdict: "no".to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        says_yes(&self.verdict)
    }
}

pub(crate) fn completeness_question(solution: &str) -> String {
    format!(
        "\nIs the following text claiming that the solution is complete?\n{RULE}\n\n{solution}\n\n{RULE}\n\nRespond with exactly \"yes\" or \"no\". No other words.\n"
    )
}

pub(crate) fn verification_request(problem_statement: &str, solution: &str, reminder: &str) -> String {
    let body = detailed_solution(solution);
    format!(
        "\n{RULE}\n### Problem ###\n\n{problem_statement}\n\n{RULE}\n### Solution ###\n\n{body}\n\n{reminder}\n"
    )
}

pub(crate) fn verdict_question(critique: &str) -> String {
    format!(
        "Respond with \"yes\" or \"no\". Is the following statement saying the solution is correct, or does not contain critical error or a major justification gap?\n\n{critique}"
    )
}

impl<G: Gateway> Agent<G> {
    /// Ask whether `solution` claims to be complete
    pub async fn check_claimed_complete(&self, solution: &str) -> Result<bool> {
        let conversation = Conversation::from_user(completeness_question(solution));
        let Some(reply) = self.gateway.generate(None, &conversation, false).await else {
            tracing::debug!("completeness check got no reply");
            return Ok(false);
        };

        self.console.line(&reply)?;
        Ok(says_yes(&reply))
    }

    /// Critique `solution`, then ask the model whether the critique calls it correct
    pub async fn verify_solution(
        &self,
        problem_statement: &str,
        solution: &str,
    ) -> Result<VerificationOutcome> {
        let verbose = self.config.verbose;
        let console = &self.console;

        if verbose {
            console.line(">>>>>>> Start verification.")?;
        }

        let request = verification_request(
            problem_statement,
            solution,
            &self.prompts.verification_reminder,
        );
        let Some(critique) = self
            .gateway
            .generate(
                Some(self.prompts.verification_system.as_str()),
                &Conversation::from_user(request),
                verbose,
            )
            .await
        else {
            console.line(">>>>>>> Verification call failed.")?;
            return Ok(VerificationOutcome::unverified());
        };

        if verbose {
            console.block(">>>>>>> Verification results:", &critique)?;
        }

        let Some(verdict) = self
            .gateway
            .generate(None, &Conversation::from_user(verdict_question(&critique)), verbose)
            .await
        else {
            console.line(">>>>>>> Verification check call failed.")?;
            return Ok(VerificationOutcome::unverified());
        };

        if verbose {
            console.block(">>>>>>> Is verification good?", &verdict)?;
        }

        let bug_report = if says_yes(&verdict) {
            String::new()
        } else {
            text_before(&critique, DETAILED_VERIFICATION).to_string()
        };

        if verbose {
            console.block(">>>>>>> Bug report:", &bug_report)?;
        }
        tracing::debug!(passed = says_yes(&verdict), "verification finished");

        Ok(VerificationOutcome { bug_report, verdict })
    }
}
