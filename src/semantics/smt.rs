//! Z3 backend for the solving oracle

use crate::ir::{BoolTerm, BvTerm, Formula, Symbol};
use crate::semantics::oracle::{Model, Oracle, OracleError, SolveOutcome};
use std::collections::HashMap;
use std::time::Duration;
use z3::ast::{Ast, BV, Bool};
use z3::{Params, SatResult, Solver};

/// Configuration for the SMT solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Timeout for SMT solving (None means no timeout)
    pub timeout: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SolverConfig {
    /// Create a config with no timeout
    pub fn no_timeout() -> Self {
        Self { timeout: None }
    }

    /// Create a config with a specific timeout in seconds
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Some(Duration::from_secs(secs)),
        }
    }

    /// Create a config with a specific timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Create a Z3 solver with the given configuration
pub fn create_solver_with_config(cfg: &SolverConfig) -> Solver {
    let solver = Solver::new();
    if let Some(timeout) = cfg.timeout {
        let mut params = Params::new();
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        params.set_u32("timeout", millis);
        solver.set_params(&params);
    }
    solver
}

/// Translation of formula terms into Z3 ASTs, with a scoped symbol table
struct Lowering {
    vars: HashMap<String, BV>,
}

impl Lowering {
    fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    fn declare(&mut self, symbol: &Symbol) -> BV {
        let bv = BV::new_const(symbol.name.clone(), symbol.width);
        self.vars.insert(symbol.name.clone(), bv.clone());
        bv
    }

    fn constant(value: u128, width: u32) -> Result<BV, OracleError> {
        match width {
            0 => Err(OracleError::UnsupportedWidth(0)),
            1..=64 => Ok(BV::from_u64(value as u64, width)),
            65..=128 => {
                let high = BV::from_u64((value >> 64) as u64, width - 64);
                let low = BV::from_u64(value as u64, 64);
                Ok(high.concat(&low))
            }
            _ => Err(OracleError::UnsupportedWidth(width)),
        }
    }

    fn bv(&self, term: &BvTerm) -> Result<BV, OracleError> {
        Ok(match term {
            BvTerm::Var(sym) => self
                .vars
                .get(&sym.name)
                .cloned()
                .ok_or_else(|| OracleError::UnknownSymbol(sym.name.clone()))?,
            BvTerm::Const { value, width } => Self::constant(*value, *width)?,
            BvTerm::ZeroExt { extra, inner } => self.bv(inner)?.zero_ext(*extra),
            BvTerm::Extract { high, low, inner } => self.bv(inner)?.extract(*high, *low),
            BvTerm::Mul(lhs, rhs) => self.bv(lhs)?.bvmul(&self.bv(rhs)?),
            BvTerm::LShr(lhs, rhs) => self.bv(lhs)?.bvlshr(&self.bv(rhs)?),
            BvTerm::UDiv(lhs, rhs) => self.bv(lhs)?.bvudiv(&self.bv(rhs)?),
        })
    }

    fn bool(&mut self, term: &BoolTerm) -> Result<Bool, OracleError> {
        Ok(match term {
            BoolTerm::Eq(lhs, rhs) => self.bv(lhs)?.eq(&self.bv(rhs)?),
            BoolTerm::ULe(lhs, rhs) => self.bv(lhs)?.bvule(&self.bv(rhs)?),
            BoolTerm::ULt(lhs, rhs) => self.bv(lhs)?.bvult(&self.bv(rhs)?),
            BoolTerm::Not(inner) => self.bool(inner)?.not(),
            BoolTerm::ForAll { bound, body } => {
                // Bound names shadow free symbols of the same name inside the body
                let shadowed: Vec<(String, Option<BV>)> = bound
                    .iter()
                    .map(|sym| (sym.name.clone(), self.vars.get(&sym.name).cloned()))
                    .collect();
                let consts: Vec<BV> = bound.iter().map(|sym| self.declare(sym)).collect();
                let body = self.bool(body);
                for (name, previous) in shadowed {
                    match previous {
                        Some(bv) => self.vars.insert(name, bv),
                        None => self.vars.remove(&name),
                    };
                }
                let body = body?;
                let bounds: Vec<&dyn Ast> = consts.iter().map(|c| c as &dyn Ast).collect();
                z3::ast::forall_const(&bounds, &[], &body)
            }
        })
    }
}

/// Oracle backed by Z3. A fresh solver is created for every query, on the
/// calling thread.
#[derive(Debug, Clone, Default)]
pub struct Z3Oracle {
    config: SolverConfig,
}

impl Z3Oracle {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl Oracle for Z3Oracle {
    fn solve(&self, formula: &Formula) -> Result<SolveOutcome, OracleError> {
        let solver = create_solver_with_config(&self.config);
        let mut lowering = Lowering::new();

        let mut free = Vec::with_capacity(formula.free.len());
        for sym in &formula.free {
            if sym.width == 0 || sym.width > 64 {
                return Err(OracleError::UnsupportedWidth(sym.width));
            }
            free.push((sym.name.clone(), lowering.declare(sym)));
        }
        for assertion in &formula.assertions {
            solver.assert(&lowering.bool(assertion)?);
        }

        match solver.check() {
            SatResult::Unsat => Ok(SolveOutcome::Unsatisfiable),
            SatResult::Unknown => Ok(SolveOutcome::Unknown(
                solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
            SatResult::Sat => {
                let z3_model = solver
                    .get_model()
                    .ok_or_else(|| OracleError::Backend("sat result without a model".into()))?;
                let mut model = Model::new();
                for (name, bv) in &free {
                    let value = z3_model
                        .eval(bv, true)
                        .and_then(|v| v.as_u64())
                        .ok_or_else(|| {
                            OracleError::Backend(format!("no value for '{}' in model", name))
                        })?;
                    model.values.insert(name.clone(), value);
                }
                Ok(SolveOutcome::Satisfiable(model))
            }
        }
    }

    fn name(&self) -> &str {
        "z3"
    }
}
