//! Pulling labelled sections out of free-form model output
//!
//! Extraction never fails: a missing marker yields an empty string, which
//! callers treat as "nothing useful found".

/// Marker preceding the proof body in a solution
pub const DETAILED_SOLUTION: &str = "Detailed Solution";

/// Marker preceding the step-by-step log in a critique
pub const DETAILED_VERIFICATION: &str = "Detailed Verification";

/// Trimmed text after the first occurrence of `marker`, or `""`
pub fn text_after<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.find(marker) {
        Some(idx) => text[idx + marker.len()..].trim(),
        None => "",
    }
}

/// Trimmed text before the first occurrence of `marker`, or `""`
pub fn text_before<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.find(marker) {
        Some(idx) => text[..idx].trim(),
        None => "",
    }
}

/// The proof body of a solution
pub fn detailed_solution(solution: &str) -> &str {
    text_after(solution, DETAILED_SOLUTION)
}

/// Whether a model reply counts as "yes": case-insensitive containment, anywhere
pub fn says_yes(reply: &str) -> bool {
    reply.to_lowercase().contains("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_after_and_before() {
        let text = "### Summary ###\nok\n### Detailed Solution ###\n  trivial proof \n";
        assert_eq!(text_after(text, DETAILED_SOLUTION), "###\n  trivial proof");
        assert_eq!(text_before(text, DETAILED_SOLUTION), "### Summary ###\nok\n###");
        assert_eq!(detailed_solution("### Detailed Solution ### trivial"), "### trivial");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "a Detailed Solution b Detailed Solution c";
        assert_eq!(text_after(text, DETAILED_SOLUTION), "b Detailed Solution c");
        assert_eq!(text_before(text, DETAILED_SOLUTION), "a");
    }

    #[test]
    fn test_missing_marker_is_empty() {
        let text = "no markers here";
        assert_eq!(text_after(text, DETAILED_SOLUTION), "");
        assert_eq!(text_before(text, DETAILED_VERIFICATION), "");

        // extracting again from the empty result changes nothing
        let once = text_after(text, DETAILED_SOLUTION);
        assert_eq!(text_after(once, DETAILED_SOLUTION), "");
    }

    #[test]
    fn test_says_yes_is_loose() {
        assert!(says_yes("Yes, this is complete."));
        assert!(says_yes("no clear issues, yes it's correct"));
        assert!(says_yes("EYES"));
        assert!(!says_yes("No, missing a case."));
        assert!(!says_yes(""));
    }
}
