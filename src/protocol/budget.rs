//! Post-pass budget decisions.

use crate::types::StreamResult;

use super::segment::has_marker;

/// What to do after a reasoning-bounded pass.
///
/// Hitting the token limit is the only truncation signal the endpoint gives;
/// whether the marker was seen tells "cut off mid-reasoning" apart from "cut
/// off mid-answer".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetDecision {
    /// Reasoning was cut off before closing; inject the early-stop directive.
    pub needs_early_stop: bool,
    /// The pass hit its limit; a continuation pass must follow.
    pub needs_continuation: bool,
}

impl BudgetDecision {
    pub fn evaluate(result: &StreamResult) -> Self {
        let needs_continuation = result.hit_length_limit();
        let needs_early_stop = needs_continuation && !has_marker(&result.combined_text());
        Self {
            needs_early_stop,
            needs_continuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::early_stop::inject;
    use crate::types::Termination;

    fn result(reasoning: &str, answer: &str, termination: Option<Termination>) -> StreamResult {
        StreamResult {
            reasoning: reasoning.to_string(),
            answer: answer.to_string(),
            termination,
        }
    }

    #[test]
    fn natural_stop_needs_nothing() {
        let decision = BudgetDecision::evaluate(&result(
            "2+2 is 4</think>",
            "4.",
            Some(Termination::NaturalStop),
        ));
        assert_eq!(decision, BudgetDecision::default());
    }

    #[test]
    fn truncated_without_marker_needs_both() {
        let decision = BudgetDecision::evaluate(&result(
            "long derivation",
            "",
            Some(Termination::LengthLimit),
        ));
        assert!(decision.needs_early_stop);
        assert!(decision.needs_continuation);
    }

    #[test]
    fn truncated_after_marker_only_continues() {
        let decision = BudgetDecision::evaluate(&result(
            "done</think>",
            "The answer is",
            Some(Termination::LengthLimit),
        ));
        assert!(!decision.needs_early_stop);
        assert!(decision.needs_continuation);
    }

    #[test]
    fn marker_split_across_channels_counts() {
        let decision = BudgetDecision::evaluate(&result(
            "done</thi",
            "nk>partial",
            Some(Termination::LengthLimit),
        ));
        assert!(!decision.needs_early_stop);
    }

    #[test]
    fn unknown_termination_never_continues() {
        let decision = BudgetDecision::evaluate(&result("cut", "", None));
        assert_eq!(decision, BudgetDecision::default());
    }

    #[test]
    fn injection_clears_early_stop() {
        let truncated = result("thinking hard", "", Some(Termination::LengthLimit));
        assert!(BudgetDecision::evaluate(&truncated).needs_early_stop);

        let injected = result(
            &inject(&truncated.combined_text()),
            "",
            Some(Termination::LengthLimit),
        );
        assert!(!BudgetDecision::evaluate(&injected).needs_early_stop);
    }
}
