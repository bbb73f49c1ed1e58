//! Construction of the correctness formulas handed to the oracle

use crate::ir::{
    BoolTerm, BvTerm, Candidate, Divisor, Formula, FormulaKind, MultiplierRange, Symbol, Width,
};
use tracing::trace;

/// Free symbol for the multiplier `a`
pub const MULTIPLIER: &str = "a";
/// Free symbol for the shift `s`
pub const SHIFT: &str = "s";
/// Input symbol `x` (universally bound in search formulas, free in counterexample formulas)
pub const INPUT: &str = "x";
/// Free symbol for the multiplier of the scaled variant
pub const SCALED_MULTIPLIER: &str = "m";

/// `truncate_W((zext(a, W) * zext(x, W)) >> zext(s, W))`
fn multiply_shift(width: Width, multiplier: BvTerm, input: BvTerm, shift: BvTerm) -> BvTerm {
    let w = width.bits();
    multiplier
        .zero_ext(w)
        .mul(input.zero_ext(w))
        .lshr(shift.zero_ext(w))
        .extract(w - 1, 0)
}

fn quotient(divisor: Divisor, input: BvTerm) -> BvTerm {
    input.udiv(BvTerm::constant(
        u128::from(divisor.value()),
        divisor.width().bits(),
    ))
}

/// Build the search formula: find `a` and `s < 2W` such that for all `x`,
/// `x / d == truncate_W((a * x) >> s)`.
///
/// With a bound, `min_a <= a < max_a` is added. The comparison is done in
/// `W + 1` bits so that an upper bound of `2^W` stays representable.
pub fn build_formula(divisor: Divisor, bound: Option<MultiplierRange>) -> Formula {
    let width = divisor.width();
    let w = width.bits();

    let a = Symbol::new(MULTIPLIER, w);
    let s = Symbol::new(SHIFT, w);
    let x = Symbol::new(INPUT, w);

    let mut formula = Formula::new(FormulaKind::Search { bound });
    formula.declare(a.clone());
    formula.declare(s.clone());

    // s < 2W, compared in 2W bits
    formula.assert(
        BvTerm::var(&s)
            .zero_ext(w)
            .ult(BvTerm::constant(u128::from(width.shift_limit()), width.double())),
    );

    if let Some(range) = bound {
        let a_wide = BvTerm::var(&a).zero_ext(1);
        formula.assert(BvTerm::constant(range.start, w + 1).ule(a_wide.clone()));
        formula.assert(a_wide.ult(BvTerm::constant(range.end, w + 1)));
    }

    let equality = quotient(divisor, BvTerm::var(&x)).eq(multiply_shift(
        width,
        BvTerm::var(&a),
        BvTerm::var(&x),
        BvTerm::var(&s),
    ));
    formula.assert(BoolTerm::forall(vec![x], equality));

    trace!(divisor = divisor.value(), width = w, "search formula:\n{}", formula);
    formula
}

/// Build the negated correctness claim for a concrete candidate: is there an
/// `x` with `x / d != truncate_W((a * x) >> s)`?
pub fn build_counterexample_formula(divisor: Divisor, candidate: Candidate) -> Formula {
    let width = divisor.width();
    let w = width.bits();
    let x = Symbol::new(INPUT, w);

    let mut formula = Formula::new(FormulaKind::Counterexample { candidate });
    formula.declare(x.clone());
    formula.assert(
        quotient(divisor, BvTerm::var(&x))
            .eq(multiply_shift(
                width,
                BvTerm::constant(u128::from(candidate.multiplier), w),
                BvTerm::var(&x),
                BvTerm::constant(u128::from(candidate.shift), w),
            ))
            .not(),
    );

    trace!(%candidate, "counterexample formula:\n{}", formula);
    formula
}

/// Build the scaled (shift fixed at zero) formula: find `m` with
/// `(k * d) * m == k` in W-bit wrapping arithmetic, `k = scale mod 2^W`.
pub fn build_scaled_formula(divisor: Divisor, scale: u64) -> Formula {
    let width = divisor.width();
    let w = width.bits();
    let k = u128::from(scale) & u128::from(width.mask());
    let scaled = (k * u128::from(divisor.value())) & u128::from(width.mask());

    let m = Symbol::new(SCALED_MULTIPLIER, w);
    let mut formula = Formula::new(FormulaKind::Scaled { scale });
    formula.declare(m.clone());
    formula.assert(
        BvTerm::constant(scaled, w)
            .mul(BvTerm::var(&m))
            .eq(BvTerm::constant(k, w)),
    );

    trace!(scale, "scaled formula:\n{}", formula);
    formula
}
