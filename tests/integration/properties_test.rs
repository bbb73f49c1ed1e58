use divmagic::ir::{Candidate, Divisor, Formula, FormulaKind, Width, partition_domain};
use divmagic::semantics::concrete::{check_input, computed_quotient, expected_quotient};
use divmagic::semantics::{
    Model, Oracle, OracleError, SolveOutcome, VerificationOutcome, Verifier, VerifierConfig,
};
use proptest::prelude::*;

/// Answers counterexample queries by exhaustive search (widths up to 12)
struct ExhaustiveOracle {
    divisor: Divisor,
}

impl Oracle for ExhaustiveOracle {
    fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError> {
        let FormulaKind::Counterexample { candidate } = formula.kind else {
            return Err(OracleError::Backend("unsupported formula".into()));
        };
        let witness = (0..=self.divisor.width().max_value())
            .find(|&x| check_input(x, candidate, self.divisor).is_some());
        Ok(match witness {
            Some(x) => SolveOutcome::Satisfiable(Model::new().with("x", x)),
            None => SolveOutcome::Unsatisfiable,
        })
    }
}

fn arb_divisor() -> impl Strategy<Value = Divisor> {
    (2u32..=12).prop_flat_map(|bits| {
        (2u64..(1u64 << bits)).prop_map(move |d| Divisor::from_raw(d, bits).unwrap())
    })
}

proptest! {
    #[test]
    fn partition_covers_domain_exactly(bits in 2u32..=64, parts in 1usize..20_000) {
        let width = Width::new(bits).unwrap();
        let ranges = partition_domain(width, parts);

        prop_assert_eq!(ranges.len(), parts);
        prop_assert_eq!(ranges[0].start, 0);
        prop_assert_eq!(ranges[parts - 1].end, width.modulus());
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
            prop_assert!(pair[0].start <= pair[0].end);
        }
        let total: u128 = ranges.iter().map(|r| r.len()).sum();
        prop_assert_eq!(total, width.modulus());
    }

    #[test]
    fn rejection_carries_a_real_counterexample(
        d in arb_divisor(),
        multiplier in any::<u64>(),
        shift in 0u32..128,
        screen in any::<bool>(),
    ) {
        let width = d.width();
        let candidate = Candidate::new(multiplier & width.mask(), shift % width.shift_limit());
        let oracle = ExhaustiveOracle { divisor: d };

        let config = if screen { VerifierConfig::default() } else { VerifierConfig::oracle_only() };
        let verifier = Verifier::new(&oracle, config);
        match verifier.verify(candidate, d).unwrap() {
            VerificationOutcome::Rejected(cex) => {
                prop_assert!(cex.x <= width.max_value());
                prop_assert_eq!(cex.expected, cex.x / d.value());
                prop_assert_eq!(cex.expected, expected_quotient(cex.x, d));
                prop_assert_eq!(cex.computed, computed_quotient(cex.x, candidate, d));
                prop_assert_ne!(cex.expected, cex.computed);
            }
            VerificationOutcome::Accepted => {
                for x in 0..=width.max_value() {
                    prop_assert_eq!(expected_quotient(x, d), computed_quotient(x, candidate, d));
                }
            }
            VerificationOutcome::Inconclusive(reason) => {
                prop_assert!(false, "exhaustive oracle is never inconclusive: {}", reason);
            }
        }
    }

    #[test]
    fn verification_is_idempotent(d in arb_divisor(), multiplier in any::<u64>(), shift in 0u32..128) {
        let width = d.width();
        let candidate = Candidate::new(multiplier & width.mask(), shift % width.shift_limit());
        let oracle = ExhaustiveOracle { divisor: d };

        let verifier = Verifier::new(&oracle, VerifierConfig::default());
        let first = verifier.verify(candidate, d).unwrap();
        let second = verifier.verify(candidate, d).unwrap();
        prop_assert_eq!(first, second);
    }
}
