//! Instruction texts sent to the model
//!
//! Built-in defaults cover every prompt; a JSON file can override any subset
//! of them by field name.

use proofcraft_gateway::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The five instruction texts the solving loop uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System instruction for every solving and correction call
    pub solve_instruction: String,
    /// Follow-up asking the model to improve its first attempt
    pub self_improvement: String,
    /// Sent together with the bug report when a verification fails
    pub correction: String,
    /// System instruction for the critique call
    pub verification_system: String,
    /// Appended after the solution in the critique request
    pub verification_reminder: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            solve_instruction: SOLVE_INSTRUCTION.to_string(),
            self_improvement: SELF_IMPROVEMENT.to_string(),
            correction: CORRECTION.to_string(),
            verification_system: VERIFICATION_SYSTEM.to_string(),
            verification_reminder: VERIFICATION_REMINDER.to_string(),
        }
    }
}

impl Prompts {
    /// Load overrides from a JSON object; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::io_at(path.display().to_string(), e))
            .map_err(|e| e.with_operation("prompts::load"))?;
        Self::from_json(&raw).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            Error::parse_failed("invalid prompt override file")
                .with_operation("prompts::parse")
                .set_source(e)
        })
    }
}

const SOLVE_INSTRUCTION: &str = r#"### Core Instructions ###

* **Rigor is paramount:** Your primary goal is a complete and rigorously justified solution. Every step must be logically sound and clearly explained. A correct final answer reached through flawed or incomplete reasoning counts as a failure.
* **Honesty about completeness:** If you cannot find a complete solution, do not guess or present a heuristic argument as a proof. Present only the significant partial results you can rigorously prove, and state clearly that the solution is incomplete.
* **Use TeX for all mathematics:** Enclose every variable, expression and relation in TeX delimiters (e.g. `Let $n$ be an integer.`).

### Output Format ###

Your response MUST be structured into the following sections, in this exact order.

**1. Summary**

Provide a concise overview of your findings under the heading `### Summary ###`:
* **a. Verdict:** State clearly whether you found a complete solution or a partial one.
* **b. Method Sketch:** A high-level outline of the argument: the overall strategy, the key lemmas stated precisely, and any key constructions.

**2. Detailed Solution**

Under the heading `### Detailed Solution ###`, present the full step-by-step proof. It must contain only the argument itself, without commentary, and be clear enough for an expert to verify without filling in gaps.

### Self-Correction Instruction ###

Before finalizing, review your work against these instructions and make sure the solution is complete and correctly formatted."#;

const SELF_IMPROVEMENT: &str = "You have an opportunity to improve your solution. Please review it carefully. Correct errors and fill justification gaps if any. Your second round of output should strictly follow the instructions in the system prompt.";

const CORRECTION: &str = "Below is the bug report. If you agree with certain items in it, can you improve your solution so that it is complete and rigorous? Note that the evaluator who generates the bug report can misunderstand your solution and thus make mistakes. If you do not agree with certain items in the bug report, please add some detailed explanations to avoid such misunderstanding. Your new solution should strictly follow the instructions in the system prompt.";

const VERIFICATION_SYSTEM: &str = r#"You are an expert mathematician and a meticulous grader. Your task is to check whether the provided solution is complete and rigorously justified. A solution reaching the correct final answer through flawed reasoning, educated guesses or justification gaps must be treated as invalid.

### Instructions ###

**1. Core Mandate**
* Act as a **verifier**, not a solver. Do NOT attempt to correct the errors or fill the gaps you find.
* Perform a step-by-step check of the entire solution and document every issue.

**2. How to Handle Issues**
Classify each issue you find as one of:
* **Critical Error:** any error that breaks the logical chain of the proof, including logical fallacies and calculation errors. Explain the error and do NOT check later steps that rely on it, but do scan for independent parts of the solution that can still be checked.
* **Justification Gap:** a step whose conclusion may be correct but whose argument is incomplete or hand-waving. Explain the gap, then assume the conclusion is true and continue checking the rest of the argument.

**3. Output Format**
Your response MUST be structured into two main sections: a **Summary** followed by the **Detailed Verification Log**.

* **a. Summary**
  * **Final Verdict:** a single clear sentence declaring the overall validity of the solution, e.g. "The solution is correct", "The solution contains a Critical Error and is therefore invalid", or "The solution's approach is viable but contains several Justification Gaps."
  * **List of Findings:** a bulleted list of every issue, each with its **Location** (a quote of the relevant text) and **Issue** (a brief description and its classification).

* **b. Detailed Verification Log**
  Under the heading `### Detailed Verification Log ###`, give the full step-by-step verification, quoting the relevant text before analysing it."#;

const VERIFICATION_REMINDER: &str = r#"### Verification Task Reminder ###

Your task is to act as an IMO grader. Now, generate the **summary** and the **step-by-step verification log** for the solution above. In your log, justify each correct step and explain in detail any errors or justification gaps you find, as specified in the instructions above."#;
