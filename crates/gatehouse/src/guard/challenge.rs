//! Arithmetic challenge generation.

use gatehouse_common::Challenge;
use gatehouse_common::constants::{OPERAND_MIN, OPERAND_SPAN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies challenge operands.
///
/// Kept behind a trait so tests can pin the operands.
pub trait OperandSource: Send + 'static {
    /// Draw one operand in `[OPERAND_MIN, OPERAND_MIN + OPERAND_SPAN)`
    fn draw(&mut self) -> i64;
}

/// Uniform operands from any RNG
pub struct RngOperands<R> {
    rng: R,
}

impl<R: Rng + Send + 'static> RngOperands<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngOperands<StdRng> {
    /// OS-seeded source for production use
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Reproducible source
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send + 'static> OperandSource for RngOperands<R> {
    fn draw(&mut self) -> i64 {
        let unit: f64 = self.rng.random();
        (unit * OPERAND_SPAN as f64).floor() as i64 + OPERAND_MIN
    }
}

/// Draw two independent operands and build a challenge
pub fn arm_challenge(source: &mut dyn OperandSource) -> Challenge {
    let operand_a = source.draw();
    let operand_b = source.draw();
    Challenge::new(operand_a, operand_b)
}

#[cfg(test)]
pub use scripted::ScriptedOperands;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands_stay_in_range() {
        let mut source = RngOperands::seeded(7);
        let mut seen = [false; 6];
        for _ in 0..5_000 {
            let value = source.draw();
            assert!((2..=7).contains(&value), "operand {value} out of range");
            seen[(value - 2) as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit), "every operand value should appear");
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = RngOperands::seeded(99);
        let mut b = RngOperands::seeded(99);
        let first: Vec<i64> = (0..16).map(|_| a.draw()).collect();
        let second: Vec<i64> = (0..16).map(|_| b.draw()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_arm_challenge_uses_two_draws() {
        let mut source = ScriptedOperands::new(&[4, 5]);
        let challenge = arm_challenge(&mut source);
        assert_eq!((challenge.operand_a, challenge.operand_b), (4, 5));
        assert_eq!(challenge.expected_sum, 9);
    }
}
