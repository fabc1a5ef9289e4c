//! Exploration bootstrap: first draft, self-improvement, completeness, verification

use crate::agent::Agent;
use crate::checks::VerificationOutcome;
use proofcraft_gateway::{Gateway, Result};

/// A complete candidate solution together with its first verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exploration {
    pub solution: String,
    pub bug_report: String,
    pub verdict: String,
}

impl<G: Gateway> Agent<G> {
    /// Produce an initial candidate. `None` when any generation fails or the
    /// improved solution does not claim to be complete.
    ///
    /// A failing verification is still a successful bootstrap; the verdict is
    /// handed to the correction loop.
    pub async fn init_explorations(
        &self,
        problem_statement: &str,
        other_prompts: &[String],
    ) -> Result<Option<Exploration>> {
        let console = &self.console;
        let instruction = Some(self.prompts.solve_instruction.as_str());
        let verbose = self.config.verbose;

        let mut conversation = self.problem_conversation(problem_statement, other_prompts);

        console.line(">>>>>>> Initial prompt.")?;
        let Some(first) = self.gateway.generate(instruction, &conversation, verbose).await else {
            console.line(">>>>>>> Initial generation failed.")?;
            return Ok(None);
        };
        console.block(">>>>>>> First solution:", &first)?;

        console.line(">>>>>>> Self improvement start:")?;
        conversation
            .push_model(first)
            .push_user(self.prompts.self_improvement.as_str());

        let Some(solution) = self.gateway.generate(instruction, &conversation, verbose).await else {
            console.line(">>>>>>> Self-improvement generation failed.")?;
            return Ok(None);
        };
        console.block(">>>>>>> Corrected solution:", &solution)?;

        console.line(">>>>>>> Check if solution is complete:")?;
        if !self.check_claimed_complete(&solution).await? {
            console.line(">>>>>>> Solution is not complete. Failed.")?;
            return Ok(None);
        }

        console.line(">>>>>>> Verify the solution.")?;
        let VerificationOutcome { bug_report, verdict } =
            self.verify_solution(problem_statement, &solution).await?;

        console.block(">>>>>>> Initial verification:", &bug_report)?;
        console.line(format!(">>>>>>> verify results: {}", verdict))?;

        Ok(Some(Exploration {
            solution,
            bug_report,
            verdict,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::Prompts;
    use crate::test_support::{console, Reply, StubGateway};
    use proofcraft_gateway::Role;

    #[tokio::test]
    async fn test_bootstrap_success_carries_failed_verdict() {
        let agent = Agent::new(StubGateway::always(Reply::No), console());

        let exploration = agent
            .init_explorations("Prove 1+1=2", &["Be brief.".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(exploration.solution, StubGateway::SOLUTION);
        assert_eq!(exploration.verdict, StubGateway::VERDICT_NO);
        assert_eq!(exploration.bug_report, StubGateway::BUG_REPORT);

        // the self-improvement call sees the first draft and the follow-up
        let second = agent.gateway().last_solve().unwrap();
        let turns = second.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[1].joined_text(), "Be brief.");
        assert_eq!(turns[2].role(), Role::Model);
        assert_eq!(turns[3].joined_text(), Prompts::default().self_improvement);
    }

    #[tokio::test]
    async fn test_first_generation_failure() {
        let agent = Agent::new(StubGateway::always(Reply::Yes).fail_solves_after(0), console());
        assert_eq!(agent.init_explorations("p", &[]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_self_improvement_failure() {
        let agent = Agent::new(StubGateway::always(Reply::Yes).fail_solves_after(1), console());
        assert_eq!(agent.init_explorations("p", &[]).await.unwrap(), None);
        assert_eq!(agent.gateway().calls().solves, 2);
    }

    #[tokio::test]
    async fn test_incomplete_solution_stops_before_verification() {
        let agent = Agent::new(
            StubGateway::always(Reply::Yes).complete_reply("no"),
            console(),
        );

        assert_eq!(agent.init_explorations("p", &[]).await.unwrap(), None);
        assert_eq!(agent.gateway().calls().verifications, 0);
    }
}
