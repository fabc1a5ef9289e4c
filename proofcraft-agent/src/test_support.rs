//! Scripted gateway shared by the unit tests

use crate::prompts::Prompts;
use proofcraft_gateway::{Console, Conversation, Gateway};
use std::sync::{Arc, Mutex};

pub fn console() -> Arc<Console> {
    Arc::new(Console::silent())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub solves: usize,
    pub completeness: usize,
    pub verifications: usize,
    pub verdicts: usize,
}

#[derive(Default)]
struct Recorded {
    calls: Calls,
    last_solve: Option<Conversation>,
    last_critique: Option<Conversation>,
    last_unsystem: Option<Conversation>,
}

/// Answers by call kind: solving calls, completeness checks, critiques, verdicts
pub struct StubGateway {
    verdict: Reply,
    complete_reply: Option<String>,
    incomplete_after: Option<usize>,
    solves_before_failure: Option<usize>,
    silent_critique: bool,
    prompts: Prompts,
    recorded: Mutex<Recorded>,
}

impl StubGateway {
    pub const SOLUTION: &'static str = "### Detailed Solution ### trivial";
    pub const CRITIQUE: &'static str =
        "Summary: there is a flaw in step 2.\n\n### Detailed Verification Log ###\nStep 2 divides by zero.";
    pub const BUG_REPORT: &'static str = "Summary: there is a flaw in step 2.\n\n###";
    pub const VERDICT_YES: &'static str = "no clear issues, yes it's correct";
    pub const VERDICT_NO: &'static str = "there is a flaw ... no.";

    pub fn always(verdict: Reply) -> Self {
        Self {
            verdict,
            complete_reply: Some("yes".to_string()),
            incomplete_after: None,
            solves_before_failure: None,
            silent_critique: false,
            prompts: Prompts::default(),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn complete_reply(mut self, reply: &str) -> Self {
        self.complete_reply = Some(reply.to_string());
        self
    }

    /// Completeness checks return nothing
    pub fn silent_completeness(mut self) -> Self {
        self.complete_reply = None;
        self
    }

    /// Completeness checks answer "no" once `n` of them have answered
    pub fn incomplete_after(mut self, n: usize) -> Self {
        self.incomplete_after = Some(n);
        self
    }

    /// Solving calls return nothing once `n` of them have answered
    pub fn fail_solves_after(mut self, n: usize) -> Self {
        self.solves_before_failure = Some(n);
        self
    }

    pub fn silent_critique(mut self) -> Self {
        self.silent_critique = true;
        self
    }

    pub fn calls(&self) -> Calls {
        self.recorded.lock().unwrap().calls
    }

    pub fn last_solve(&self) -> Option<Conversation> {
        self.recorded.lock().unwrap().last_solve.clone()
    }

    pub fn last_critique(&self) -> Option<Conversation> {
        self.recorded.lock().unwrap().last_critique.clone()
    }

    pub fn last_unsystem(&self) -> Option<Conversation> {
        self.recorded.lock().unwrap().last_unsystem.clone()
    }
}

impl Gateway for StubGateway {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        conversation: &Conversation,
        _verbose: bool,
    ) -> Option<String> {
        let mut recorded = self.recorded.lock().unwrap();

        match system_instruction {
            Some(system) if system == self.prompts.verification_system => {
                recorded.calls.verifications += 1;
                recorded.last_critique = Some(conversation.clone());
                if self.silent_critique {
                    return None;
                }
                Some(Self::CRITIQUE.to_string())
            }
            Some(_) => {
                recorded.calls.solves += 1;
                recorded.last_solve = Some(conversation.clone());
                match self.solves_before_failure {
                    Some(n) if recorded.calls.solves > n => None,
                    _ => Some(Self::SOLUTION.to_string()),
                }
            }
            None => {
                recorded.last_unsystem = Some(conversation.clone());
                let asked = conversation.turns()[0].joined_text();
                if asked.contains("claiming that the solution is complete") {
                    recorded.calls.completeness += 1;
                    match self.incomplete_after {
                        Some(n) if recorded.calls.completeness > n => Some("no".to_string()),
                        _ => self.complete_reply.clone(),
                    }
                } else {
                    recorded.calls.verdicts += 1;
                    Some(
                        match self.verdict {
                            Reply::Yes => Self::VERDICT_YES,
                            Reply::No => Self::VERDICT_NO,
                        }
                        .to_string(),
                    )
                }
            }
        }
    }
}
