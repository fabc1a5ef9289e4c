//! Agent implementation - the correction loop around the gateway

use crate::explore::Exploration;
use crate::extract::says_yes;
use crate::prompts::Prompts;
use proofcraft_gateway::{Console, Conversation, Gateway, Result};
use std::fmt;
use std::sync::Arc;

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Consecutive passing verifications needed to accept a solution
    pub accept_threshold: u32,
    /// Consecutive failed verifications after which the attempt is abandoned
    pub abandon_threshold: u32,
    /// Hard cap on correction loop iterations
    pub max_iterations: u32,
    /// Print gateway banners and verification details
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 5,
            abandon_threshold: 10,
            max_iterations: 30,
            verbose: true,
        }
    }
}

/// Counters driving acceptance and abandonment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopState {
    pub correct_count: u32,
    pub error_count: u32,
    pub iteration: u32,
}

impl LoopState {
    /// Seed the counters from the bootstrap verdict
    pub fn from_bootstrap(verdict: &str) -> Self {
        Self {
            correct_count: u32::from(says_yes(verdict)),
            error_count: 0,
            iteration: 0,
        }
    }

    /// A failing verdict is about to be corrected
    pub fn begin_correction(&mut self) {
        self.correct_count = 0;
        self.error_count += 1;
    }

    /// Fold in a fresh verdict. A failure leaves `error_count` untouched.
    pub fn record_verdict(&mut self, verdict: &str) {
        if says_yes(verdict) {
            self.correct_count += 1;
            self.error_count = 0;
        } else {
            self.correct_count = 0;
        }
    }

    pub fn accepted(&self, config: &AgentConfig) -> bool {
        self.correct_count >= config.accept_threshold
    }

    pub fn exhausted(&self, config: &AgentConfig) -> bool {
        self.error_count >= config.abandon_threshold
    }
}

/// Why an attempt ended without a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// Bootstrap failed to produce a complete candidate
    BootstrapFailed,
    /// The gateway returned nothing for a correction request
    CorrectionFailed,
    /// A corrected solution no longer claims to be complete
    IncompleteAfterCorrection,
    /// Too many verification failures in a row
    TooManyErrors,
    /// Iteration cap reached
    IterationLimit,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbandonReason::BootstrapFailed => "failed to find a complete solution during initialization",
            AbandonReason::CorrectionFailed => "correction attempt produced no response",
            AbandonReason::IncompleteAfterCorrection => "solution is not complete after correction",
            AbandonReason::TooManyErrors => "too many consecutive verification failures",
            AbandonReason::IterationLimit => "iteration limit reached",
        };
        f.write_str(s)
    }
}

/// Result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Accepted { solution: String, iterations: u32 },
    Abandoned(AbandonReason),
}

impl AgentOutcome {
    pub fn solution(&self) -> Option<&str> {
        match self {
            AgentOutcome::Accepted { solution, .. } => Some(solution.as_str()),
            AgentOutcome::Abandoned(_) => None,
        }
    }

    pub fn into_solution(self) -> Option<String> {
        match self {
            AgentOutcome::Accepted { solution, .. } => Some(solution),
            AgentOutcome::Abandoned(_) => None,
        }
    }
}

/// The solving agent: bootstrap once, then verify and correct until a verdict sticks
pub struct Agent<G> {
    pub(crate) gateway: G,
    pub(crate) console: Arc<Console>,
    pub(crate) prompts: Prompts,
    pub(crate) config: AgentConfig,
}

impl<G: Gateway> Agent<G> {
    /// Create an agent with the default prompts and configuration
    pub fn new(gateway: G, console: Arc<Console>) -> Self {
        Self {
            gateway,
            console,
            prompts: Prompts::default(),
            config: AgentConfig::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one attempt: bootstrap, then the correction loop
    pub async fn run(&self, problem_statement: &str, other_prompts: &[String]) -> Result<AgentOutcome> {
        let console = &self.console;

        let Some(Exploration {
            mut solution,
            mut bug_report,
            mut verdict,
        }) = self.init_explorations(problem_statement, other_prompts).await?
        else {
            return self.abandon(AbandonReason::BootstrapFailed);
        };

        let mut state = LoopState::from_bootstrap(&verdict);

        for iteration in 0..self.config.max_iterations {
            state.iteration = iteration;
            console.line(format!(
                "Number of iterations: {}, number of corrects: {}, number of errors: {}",
                iteration, state.correct_count, state.error_count
            ))?;
            tracing::debug!(?state, "correction loop");

            if !says_yes(&verdict) {
                state.begin_correction();
                console.line(">>>>>>> Verification does not pass, correcting ...")?;

                let conversation = self.correction_conversation(
                    problem_statement,
                    other_prompts,
                    &solution,
                    &bug_report,
                );
                console.line(">>>>>>> New correction prompt being sent.")?;

                let Some(corrected) = self
                    .gateway
                    .generate(
                        Some(self.prompts.solve_instruction.as_str()),
                        &conversation,
                        self.config.verbose,
                    )
                    .await
                else {
                    return self.abandon(AbandonReason::CorrectionFailed);
                };

                solution = corrected;
                console.block(">>>>>>> Corrected solution:", &solution)?;

                console.line(">>>>>>> Check if new solution is complete:")?;
                if !self.check_claimed_complete(&solution).await? {
                    return self.abandon(AbandonReason::IncompleteAfterCorrection);
                }
            }

            console.line(">>>>>>> Verify the solution.")?;
            let outcome = self.verify_solution(problem_statement, &solution).await?;
            bug_report = outcome.bug_report;
            verdict = outcome.verdict;

            state.record_verdict(&verdict);
            if says_yes(&verdict) {
                console.line(">>>>>>> Solution is good, verifying again ...")?;
            }

            if state.accepted(&self.config) {
                console.block(
                    ">>>>>>> Correct solution found and verified multiple times.",
                    &solution,
                )?;
                tracing::info!(iterations = iteration + 1, "solution accepted");
                return Ok(AgentOutcome::Accepted {
                    solution,
                    iterations: iteration + 1,
                });
            }
            if state.exhausted(&self.config) {
                return self.abandon(AbandonReason::TooManyErrors);
            }
        }

        self.abandon(AbandonReason::IterationLimit)
    }

    /// Problem, auxiliary prompts, the rejected solution, then the correction request with its bug report
    fn correction_conversation(
        &self,
        problem_statement: &str,
        other_prompts: &[String],
        solution: &str,
        bug_report: &str,
    ) -> Conversation {
        let mut conversation = self.problem_conversation(problem_statement, other_prompts);
        conversation
            .push_model(solution)
            .push_user_parts([self.prompts.correction.as_str(), bug_report]);
        conversation
    }

    /// A fresh conversation holding the problem statement and each auxiliary prompt
    pub(crate) fn problem_conversation(
        &self,
        problem_statement: &str,
        other_prompts: &[String],
    ) -> Conversation {
        let mut conversation = Conversation::from_user(problem_statement);
        for prompt in other_prompts {
            conversation.push_user(prompt.as_str());
        }
        conversation
    }

    fn abandon(&self, reason: AbandonReason) -> Result<AgentOutcome> {
        tracing::info!(%reason, "attempt abandoned");
        self.console.line(format!(">>>>>>> Failed: {}.", reason))?;
        Ok(AgentOutcome::Abandoned(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{console, Reply, StubGateway};

    fn agent(gateway: StubGateway) -> Agent<StubGateway> {
        Agent::new(gateway, console()).with_config(AgentConfig {
            verbose: false,
            ..AgentConfig::default()
        })
    }

    #[test]
    fn test_loop_state_sequencing() {
        let config = AgentConfig::default();
        let mut state = LoopState::from_bootstrap("No.");
        assert_eq!(state.correct_count, 0);

        state.begin_correction();
        state.record_verdict("no");
        assert_eq!((state.correct_count, state.error_count), (0, 1));

        state.record_verdict("Yes");
        assert_eq!((state.correct_count, state.error_count), (1, 0));

        // a failure without a correction in between leaves the error count alone
        state.record_verdict("no");
        assert_eq!((state.correct_count, state.error_count), (0, 0));

        let state = LoopState {
            correct_count: 5,
            ..LoopState::default()
        };
        assert!(state.accepted(&config));
        assert!(!state.exhausted(&config));
    }

    #[tokio::test]
    async fn test_accepts_after_five_consecutive_passes() {
        let agent = agent(StubGateway::always(Reply::Yes));

        let outcome = agent.run("Prove 1+1=2", &[]).await.unwrap();

        assert_eq!(
            outcome,
            AgentOutcome::Accepted {
                solution: StubGateway::SOLUTION.to_string(),
                iterations: 4,
            }
        );
        // bootstrap: 2 solving calls, 1 completeness check, 1 verification; then 4 verifications
        let calls = agent.gateway().calls();
        assert_eq!(calls.verifications, 5);
        assert_eq!(calls.solves, 2);
        assert_eq!(calls.completeness, 1);
    }

    #[tokio::test]
    async fn test_abandons_after_ten_consecutive_failures() {
        let agent = agent(StubGateway::always(Reply::No));

        let outcome = agent.run("Prove 1+1=2", &[]).await.unwrap();

        assert_eq!(outcome, AgentOutcome::Abandoned(AbandonReason::TooManyErrors));
        let calls = agent.gateway().calls();
        // one bootstrap verification plus one per iteration
        assert_eq!(calls.verifications, 11);
        // two bootstrap solves plus ten corrections
        assert_eq!(calls.solves, 12);
    }

    #[tokio::test]
    async fn test_bootstrap_failure_abandons() {
        let agent = agent(StubGateway::always(Reply::Yes).fail_solves_after(0));

        let outcome = agent.run("Prove 1+1=2", &[]).await.unwrap();
        assert_eq!(outcome, AgentOutcome::Abandoned(AbandonReason::BootstrapFailed));
    }

    #[tokio::test]
    async fn test_failed_correction_abandons() {
        let agent = agent(StubGateway::always(Reply::No).fail_solves_after(2));

        let outcome = agent.run("Prove 1+1=2", &[]).await.unwrap();
        assert_eq!(outcome, AgentOutcome::Abandoned(AbandonReason::CorrectionFailed));
    }

    #[tokio::test]
    async fn test_incomplete_correction_abandons() {
        let agent = agent(StubGateway::always(Reply::No).incomplete_after(1));

        let outcome = agent.run("Prove 1+1=2", &[]).await.unwrap();
        assert_eq!(
            outcome,
            AgentOutcome::Abandoned(AbandonReason::IncompleteAfterCorrection)
        );
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let agent = Agent::new(StubGateway::always(Reply::No), console()).with_config(AgentConfig {
            max_iterations: 3,
            verbose: false,
            ..AgentConfig::default()
        });

        let outcome = agent.run("Prove 1+1=2", &[]).await.unwrap();
        assert_eq!(outcome, AgentOutcome::Abandoned(AbandonReason::IterationLimit));
    }

    #[tokio::test]
    async fn test_correction_conversation_shape() {
        let agent = agent(StubGateway::always(Reply::No).fail_solves_after(3));

        agent
            .run("Prove 1+1=2", &["Use induction.".to_string()])
            .await
            .unwrap();

        let correction = agent.gateway().last_solve().unwrap();
        let turns = correction.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].joined_text(), "Prove 1+1=2");
        assert_eq!(turns[1].joined_text(), "Use induction.");
        assert_eq!(turns[2].joined_text(), StubGateway::SOLUTION);
        assert_eq!(turns[3].parts().len(), 2);
        assert_eq!(turns[3].parts()[0].text, Prompts::default().correction);
        assert_eq!(turns[3].parts()[1].text, StubGateway::BUG_REPORT);
    }
}
