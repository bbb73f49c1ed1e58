//! Solver-agnostic bit-vector formulas
//!
//! The Formulator builds values of these types and `Oracle` backends lower
//! them to a concrete solver. Unlike solver ASTs they are plain data, so a
//! formula can be handed to a worker thread.

use crate::ir::range::MultiplierRange;
use crate::ir::types::Candidate;
use std::collections::HashMap;
use std::fmt;

/// A named bit-vector symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub width: u32,
}

impl Symbol {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Bit-vector valued term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BvTerm {
    Var(Symbol),
    Const { value: u128, width: u32 },
    /// Prepend `extra` zero bits
    ZeroExt { extra: u32, inner: Box<BvTerm> },
    /// Bits `high..=low` of the inner term
    Extract { high: u32, low: u32, inner: Box<BvTerm> },
    Mul(Box<BvTerm>, Box<BvTerm>),
    LShr(Box<BvTerm>, Box<BvTerm>),
    UDiv(Box<BvTerm>, Box<BvTerm>),
}

/// Boolean valued term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolTerm {
    Eq(BvTerm, BvTerm),
    ULe(BvTerm, BvTerm),
    ULt(BvTerm, BvTerm),
    Not(Box<BoolTerm>),
    ForAll { bound: Vec<Symbol>, body: Box<BoolTerm> },
}

fn mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

#[allow(clippy::should_implement_trait)]
impl BvTerm {
    pub fn var(symbol: &Symbol) -> Self {
        BvTerm::Var(symbol.clone())
    }

    pub fn constant(value: u128, width: u32) -> Self {
        BvTerm::Const {
            value: value & mask(width),
            width,
        }
    }

    pub fn zero_ext(self, extra: u32) -> Self {
        BvTerm::ZeroExt {
            extra,
            inner: Box::new(self),
        }
    }

    pub fn extract(self, high: u32, low: u32) -> Self {
        BvTerm::Extract {
            high,
            low,
            inner: Box::new(self),
        }
    }

    pub fn mul(self, other: BvTerm) -> Self {
        BvTerm::Mul(Box::new(self), Box::new(other))
    }

    pub fn lshr(self, other: BvTerm) -> Self {
        BvTerm::LShr(Box::new(self), Box::new(other))
    }

    pub fn udiv(self, other: BvTerm) -> Self {
        BvTerm::UDiv(Box::new(self), Box::new(other))
    }

    pub fn eq(self, other: BvTerm) -> BoolTerm {
        BoolTerm::Eq(self, other)
    }

    pub fn ule(self, other: BvTerm) -> BoolTerm {
        BoolTerm::ULe(self, other)
    }

    pub fn ult(self, other: BvTerm) -> BoolTerm {
        BoolTerm::ULt(self, other)
    }

    /// Bit width of the term
    pub fn width(&self) -> u32 {
        match self {
            BvTerm::Var(sym) => sym.width,
            BvTerm::Const { width, .. } => *width,
            BvTerm::ZeroExt { extra, inner } => inner.width() + extra,
            BvTerm::Extract { high, low, .. } => high - low + 1,
            BvTerm::Mul(lhs, _) | BvTerm::LShr(lhs, _) | BvTerm::UDiv(lhs, _) => lhs.width(),
        }
    }

    /// Evaluate under a concrete assignment. Returns `None` for unassigned
    /// symbols or terms wider than 128 bits.
    pub fn eval(&self, env: &Assignment) -> Option<u128> {
        if self.width() > 128 {
            return None;
        }
        let value = match self {
            BvTerm::Var(sym) => env.get(&sym.name)? & mask(sym.width),
            BvTerm::Const { value, .. } => *value,
            BvTerm::ZeroExt { inner, .. } => inner.eval(env)?,
            BvTerm::Extract { high, low, inner } => (inner.eval(env)? >> low) & mask(high - low + 1),
            BvTerm::Mul(lhs, rhs) => lhs.eval(env)?.wrapping_mul(rhs.eval(env)?) & mask(self.width()),
            BvTerm::LShr(lhs, rhs) => {
                let shift = rhs.eval(env)?;
                if shift >= u128::from(self.width()) {
                    0
                } else {
                    lhs.eval(env)? >> shift
                }
            }
            BvTerm::UDiv(lhs, rhs) => {
                // SMT-LIB: division by zero yields all ones
                let divisor = rhs.eval(env)?;
                if divisor == 0 {
                    mask(self.width())
                } else {
                    lhs.eval(env)? / divisor
                }
            }
        };
        Some(value)
    }
}

#[allow(clippy::should_implement_trait)]
impl BoolTerm {
    pub fn not(self) -> Self {
        BoolTerm::Not(Box::new(self))
    }

    pub fn forall(bound: Vec<Symbol>, body: BoolTerm) -> Self {
        BoolTerm::ForAll {
            bound,
            body: Box::new(body),
        }
    }

    /// Evaluate a quantifier-free term under a concrete assignment.
    /// Quantified terms are left to the oracle and evaluate to `None`.
    pub fn eval(&self, env: &Assignment) -> Option<bool> {
        match self {
            BoolTerm::Eq(lhs, rhs) => Some(lhs.eval(env)? == rhs.eval(env)?),
            BoolTerm::ULe(lhs, rhs) => Some(lhs.eval(env)? <= rhs.eval(env)?),
            BoolTerm::ULt(lhs, rhs) => Some(lhs.eval(env)? < rhs.eval(env)?),
            BoolTerm::Not(inner) => inner.eval(env).map(|b| !b),
            BoolTerm::ForAll { .. } => None,
        }
    }
}

/// Concrete symbol values used by `BvTerm::eval`
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    values: HashMap<String, u128>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: u128) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: u128) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<u128> {
        self.values.get(name).copied()
    }
}

/// What a formula asks, kept alongside the terms for logging and test doubles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
    /// Find `(a, s)` correct for all `x`, optionally with `a` in a range
    Search { bound: Option<MultiplierRange> },
    /// Find an `x` on which the candidate disagrees with division
    Counterexample { candidate: Candidate },
    /// Find `m` with `(k * d) * m == k` (shift fixed at zero)
    Scaled { scale: u64 },
}

/// A conjunction of assertions over declared free symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub kind: FormulaKind,
    pub free: Vec<Symbol>,
    pub assertions: Vec<BoolTerm>,
}

impl Formula {
    pub fn new(kind: FormulaKind) -> Self {
        Self {
            kind,
            free: Vec::new(),
            assertions: Vec::new(),
        }
    }

    pub fn declare(&mut self, symbol: Symbol) {
        if !self.free.contains(&symbol) {
            self.free.push(symbol);
        }
    }

    pub fn assert(&mut self, term: BoolTerm) {
        self.assertions.push(term);
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.free.iter().find(|s| s.name == name)
    }

    /// Render as an SMT-LIB2 script
    pub fn to_smtlib(&self) -> String {
        self.to_string()
    }
}

fn fmt_bv(term: &BvTerm, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match term {
        BvTerm::Var(sym) => write!(f, "{}", sym.name),
        BvTerm::Const { value, width } => write!(f, "(_ bv{} {})", value, width),
        BvTerm::ZeroExt { extra, inner } => {
            write!(f, "((_ zero_extend {}) ", extra)?;
            fmt_bv(inner, f)?;
            write!(f, ")")
        }
        BvTerm::Extract { high, low, inner } => {
            write!(f, "((_ extract {} {}) ", high, low)?;
            fmt_bv(inner, f)?;
            write!(f, ")")
        }
        BvTerm::Mul(lhs, rhs) => fmt_binary("bvmul", lhs, rhs, f),
        BvTerm::LShr(lhs, rhs) => fmt_binary("bvlshr", lhs, rhs, f),
        BvTerm::UDiv(lhs, rhs) => fmt_binary("bvudiv", lhs, rhs, f),
    }
}

fn fmt_binary(op: &str, lhs: &BvTerm, rhs: &BvTerm, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({} ", op)?;
    fmt_bv(lhs, f)?;
    write!(f, " ")?;
    fmt_bv(rhs, f)?;
    write!(f, ")")
}

impl fmt::Display for BvTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bv(self, f)
    }
}

impl fmt::Display for BoolTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolTerm::Eq(lhs, rhs) => write!(f, "(= {} {})", lhs, rhs),
            BoolTerm::ULe(lhs, rhs) => write!(f, "(bvule {} {})", lhs, rhs),
            BoolTerm::ULt(lhs, rhs) => write!(f, "(bvult {} {})", lhs, rhs),
            BoolTerm::Not(inner) => write!(f, "(not {})", inner),
            BoolTerm::ForAll { bound, body } => {
                write!(f, "(forall (")?;
                for (i, sym) in bound.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} (_ BitVec {}))", sym.name, sym.width)?;
                }
                write!(f, ") {})", body)
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(set-logic BV)")?;
        for sym in &self.free {
            writeln!(f, "(declare-const {} (_ BitVec {}))", sym.name, sym.width)?;
        }
        for assertion in &self.assertions {
            writeln!(f, "(assert {})", assertion)?;
        }
        write!(f, "(check-sat)")
    }
}
