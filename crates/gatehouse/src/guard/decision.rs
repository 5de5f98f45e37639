//! Submission screening.

use gatehouse_common::{Challenge, Decision, Rejection};

/// Decide whether a submission may be forwarded to the authentication API.
///
/// Checks run in a fixed order and stop at the first hit: honeypot, then
/// cooldown, then the challenge answer (only when a challenge is armed).
pub fn evaluate_submission(
    honeypot_value: &str,
    cooldown_active: bool,
    remaining_seconds: u64,
    challenge: Option<&Challenge>,
    challenge_answer: &str,
) -> Decision {
    // Hidden from humans, so any content at all came from a bot.
    if !honeypot_value.is_empty() {
        return Decision::Reject(Rejection::Honeypot);
    }

    if cooldown_active {
        return Decision::Reject(Rejection::CooldownActive { remaining_seconds });
    }

    if let Some(challenge) = challenge {
        if !challenge.accepts(challenge_answer) {
            return Decision::Reject(Rejection::ChallengeFailed);
        }
    }

    Decision::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_submission_proceeds() {
        assert_eq!(evaluate_submission("", false, 0, None, ""), Decision::Proceed);
    }

    #[test]
    fn test_honeypot_wins_over_everything() {
        let challenge = Challenge::new(3, 3);
        let decision = evaluate_submission("bot", true, 12, Some(&challenge), "1");
        assert_eq!(decision, Decision::Reject(Rejection::Honeypot));

        let decision = evaluate_submission(" ", false, 0, None, "");
        assert_eq!(decision, Decision::Reject(Rejection::Honeypot));
    }

    #[test]
    fn test_cooldown_wins_over_challenge() {
        let challenge = Challenge::new(3, 3);
        let decision = evaluate_submission("", true, 12, Some(&challenge), "1");
        assert_eq!(
            decision,
            Decision::Reject(Rejection::CooldownActive { remaining_seconds: 12 })
        );
    }

    #[test]
    fn test_challenge_answer_checked_when_armed() {
        let challenge = Challenge::new(4, 5);
        assert_eq!(
            evaluate_submission("", false, 0, Some(&challenge), "8"),
            Decision::Reject(Rejection::ChallengeFailed)
        );
        assert_eq!(
            evaluate_submission("", false, 0, Some(&challenge), ""),
            Decision::Reject(Rejection::ChallengeFailed)
        );
        assert_eq!(
            evaluate_submission("", false, 0, Some(&challenge), " 9 "),
            Decision::Proceed
        );
        assert_eq!(
            evaluate_submission("", false, 0, Some(&challenge), "9 apples"),
            Decision::Proceed
        );
        assert_eq!(
            evaluate_submission("", false, 0, Some(&challenge), "abc9"),
            Decision::Reject(Rejection::ChallengeFailed)
        );
    }

    #[test]
    fn test_answer_ignored_without_challenge() {
        assert_eq!(evaluate_submission("", false, 0, None, "garbage"), Decision::Proceed);
    }
}
