use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use divmagic::ir::{Candidate, Divisor, MultiplierRange};
use divmagic::search::{
    MagicReport, ParallelConfig, ScaledOutcome, ScaledSearch, SearchConfig, Verdict, find_magic,
};
use divmagic::semantics::{
    SolverConfig, VerificationOutcome, Verifier, VerifierConfig, Z3Oracle,
    build_counterexample_formula, build_formula, build_scaled_formula,
};
use divmagic::MagicError;

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INCONCLUSIVE: i32 = 2;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "divmagic")]
#[command(about = "divmagic - multiply-shift replacements for unsigned division")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Common per-query solver options
#[derive(clap::Args, Clone, Copy)]
struct SolverArgs {
    /// Bit width of the dividend
    #[arg(long, short = 'w', default_value = "32")]
    width: u32,
    /// Per-query solver timeout in seconds (0 disables the timeout)
    #[arg(long, default_value = "30")]
    solver_timeout: u64,
}

impl SolverArgs {
    fn solver_config(&self) -> SolverConfig {
        if self.solver_timeout == 0 {
            SolverConfig::no_timeout()
        } else {
            SolverConfig::with_timeout_secs(self.solver_timeout)
        }
    }
}

/// Concrete screening options for candidate verification
#[derive(clap::Args, Clone, Copy)]
struct ScreenArgs {
    /// Skip the concrete screen and verify through the solver only
    #[arg(long)]
    no_screen: bool,
    /// Random screening inputs on top of the edge cases
    #[arg(long, default_value = "32")]
    screen_samples: usize,
    /// Seed for the random screening inputs
    #[arg(long, value_parser = parse_u64_literal, default_value = "0x5eed")]
    screen_seed: u64,
}

impl ScreenArgs {
    fn verifier_config(&self) -> VerifierConfig {
        if self.no_screen {
            VerifierConfig::oracle_only()
        } else {
            VerifierConfig::default()
                .with_screen_samples(self.screen_samples)
                .with_seed(self.screen_seed)
        }
    }
}

/// CLI formula selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormula {
    /// Quantified search formula
    Search,
    /// Counterexample query for a candidate (needs --multiplier and --shift)
    Counterexample,
    /// Shift-zero scaled formula
    Scaled,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the multiplier domain and verify every candidate
    Search {
        /// Divisor (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_u64_literal)]
        divisor: u64,
        #[command(flatten)]
        solver: SolverArgs,
        /// Number of worker threads (defaults to the number of CPUs)
        #[arg(long, short = 'j')]
        workers: Option<usize>,
        /// Partitions per worker
        #[arg(long, default_value = "1024")]
        partitions_per_worker: usize,
        /// Overall search deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Try the shift-zero scaled variant first
        #[arg(long)]
        fast_path: bool,
        /// Scale constant for the fast path
        #[arg(long, value_parser = parse_u64_literal)]
        scale: Option<u64>,
        #[command(flatten)]
        screen: ScreenArgs,
        /// Print search statistics
        #[arg(long)]
        stats: bool,
    },
    /// Verify a (multiplier, shift) pair for a divisor
    Verify {
        #[arg(value_parser = parse_u64_literal)]
        divisor: u64,
        #[arg(value_parser = parse_u64_literal)]
        multiplier: u64,
        shift: u32,
        #[command(flatten)]
        solver: SolverArgs,
        #[command(flatten)]
        screen: ScreenArgs,
    },
    /// Run only the shift-zero scaled variant
    Scaled {
        #[arg(value_parser = parse_u64_literal)]
        divisor: u64,
        #[command(flatten)]
        solver: SolverArgs,
        /// Scale constant
        #[arg(long, value_parser = parse_u64_literal)]
        scale: Option<u64>,
    },
    /// Print a formula in SMT-LIB2 syntax
    Formula {
        #[arg(value_parser = parse_u64_literal)]
        divisor: u64,
        /// Bit width of the dividend
        #[arg(long, short = 'w', default_value = "32")]
        width: u32,
        #[arg(long, value_enum, default_value = "search")]
        kind: CliFormula,
        /// Lower multiplier bound of a search formula (inclusive)
        #[arg(long, value_parser = parse_u64_literal, requires = "max")]
        min: Option<u64>,
        /// Upper multiplier bound of a search formula (exclusive, may be 2^W)
        #[arg(long, value_parser = parse_u128_literal, requires = "min")]
        max: Option<u128>,
        #[arg(long, value_parser = parse_u64_literal)]
        multiplier: Option<u64>,
        #[arg(long)]
        shift: Option<u32>,
        #[arg(long, value_parser = parse_u64_literal)]
        scale: Option<u64>,
    },
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer
fn parse_u64_literal(s: &str) -> Result<u64, String> {
    let digits = s.replace('_', "");
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    };
    parsed.map_err(|_| format!("Invalid integer: {}", s))
}

fn parse_u128_literal(s: &str) -> Result<u128, String> {
    let digits = s.replace('_', "");
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => digits.parse::<u128>(),
    };
    parsed.map_err(|_| format!("Invalid integer: {}", s))
}

// --- Commands ---

struct SearchOptions {
    workers: Option<usize>,
    partitions_per_worker: usize,
    timeout: Option<Duration>,
    fast_path: bool,
    scale: Option<u64>,
    screen: ScreenArgs,
    stats: bool,
}

fn run_search(
    divisor: Divisor,
    solver: &SolverArgs,
    options: &SearchOptions,
) -> Result<i32, MagicError> {
    let parallel = ParallelConfig::default()
        .with_workers_option(options.workers)
        .with_partitions_per_worker(options.partitions_per_worker)
        .with_timeout_option(options.timeout);

    let mut config = SearchConfig::default()
        .with_solver(solver.solver_config())
        .with_parallel(parallel)
        .with_verifier(options.screen.verifier_config())
        .with_fast_path(options.fast_path);
    if let Some(scale) = options.scale {
        config = config.with_scale(scale);
    }

    println!("Searching magic numbers for divisor {}", divisor);
    println!(
        "Workers: {}, partitions: {}",
        config.parallel.num_workers,
        config.parallel.part_count()
    );

    let oracle = Z3Oracle::new(config.solver.clone());
    let report = find_magic(divisor, &config, &oracle)?;
    print_report(&report, options.stats);

    Ok(match report.verdict {
        Verdict::Solutions(_) => EXIT_OK,
        Verdict::NoSolution => EXIT_FAILURE,
        Verdict::Inconclusive { .. } => EXIT_INCONCLUSIVE,
    })
}

fn print_report(report: &MagicReport, stats: bool) {
    println!();
    if let Some(outcome) = &report.fast_path {
        println!("Fast path: {}", outcome);
    }
    print!("{}", report);
    if stats {
        if let Some(search) = &report.search {
            println!("\nSearch Statistics:");
            for line in search.statistics.format_summary().lines() {
                println!("  {}", line);
            }
        }
    }
}

fn run_verify(
    divisor: Divisor,
    candidate: Candidate,
    solver: &SolverArgs,
    screen: &ScreenArgs,
) -> Result<i32, MagicError> {
    let oracle = Z3Oracle::new(solver.solver_config());
    let verifier = Verifier::new(&oracle, screen.verifier_config());

    println!("Verifying {} for divisor {}", candidate, divisor);
    Ok(match verifier.verify(candidate, divisor)? {
        VerificationOutcome::Accepted => {
            println!("Accepted: no counterexample exists.");
            EXIT_OK
        }
        VerificationOutcome::Rejected(cex) => {
            println!("Rejected: {}", cex);
            EXIT_FAILURE
        }
        VerificationOutcome::Inconclusive(reason) => {
            println!("Inconclusive: {}", reason);
            EXIT_INCONCLUSIVE
        }
    })
}

fn run_scaled(
    divisor: Divisor,
    solver: &SolverArgs,
    scale: Option<u64>,
) -> Result<i32, MagicError> {
    let oracle = Z3Oracle::new(solver.solver_config());
    let verifier = Verifier::new(&oracle, VerifierConfig::default());
    let scaled = scale.map(ScaledSearch::new).unwrap_or_default();

    println!(
        "Scaled variant for divisor {} (scale {:#x})",
        divisor, scaled.scale
    );
    let outcome = scaled.run(divisor, &oracle, &verifier)?;
    println!("{}", outcome);

    Ok(match outcome {
        ScaledOutcome::Verified(_) => EXIT_OK,
        ScaledOutcome::Rejected { .. } | ScaledOutcome::NoSolution | ScaledOutcome::Failed(_) => {
            EXIT_FAILURE
        }
        ScaledOutcome::Inconclusive(_) => EXIT_INCONCLUSIVE,
    })
}

struct FormulaOptions {
    kind: CliFormula,
    bound: Option<MultiplierRange>,
    candidate: Option<Candidate>,
    scale: Option<u64>,
}

fn run_formula(divisor: Divisor, options: &FormulaOptions) -> Result<i32, String> {
    let formula = match options.kind {
        CliFormula::Search => {
            if let Some(range) = options.bound {
                if range.is_empty() || range.end > divisor.width().modulus() {
                    return Err(format!(
                        "Invalid multiplier bound {} for {}",
                        range,
                        divisor.width()
                    ));
                }
            }
            build_formula(divisor, options.bound)
        }
        CliFormula::Counterexample => {
            let candidate = options
                .candidate
                .ok_or("--multiplier and --shift are required for a counterexample formula")?;
            candidate
                .check_bounds(divisor.width())
                .map_err(|e| e.to_string())?;
            build_counterexample_formula(divisor, candidate)
        }
        CliFormula::Scaled => {
            build_scaled_formula(divisor, options.scale.unwrap_or(ScaledSearch::default().scale))
        }
    };
    println!("{}", formula);
    Ok(EXIT_OK)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_divisor(divisor: u64, width: u32) -> Divisor {
    match Divisor::from_raw(divisor, width) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Search {
            divisor,
            solver,
            workers,
            partitions_per_worker,
            timeout,
            fast_path,
            scale,
            screen,
            stats,
        } => {
            let divisor = parse_divisor(divisor, solver.width);
            let options = SearchOptions {
                workers,
                partitions_per_worker,
                timeout: timeout.map(Duration::from_secs),
                fast_path,
                scale,
                screen,
                stats,
            };
            run_search(divisor, &solver, &options)
                .map_err(|e| format!("Error during search: {}", e))
        }
        Commands::Verify {
            divisor,
            multiplier,
            shift,
            solver,
            screen,
        } => {
            let divisor = parse_divisor(divisor, solver.width);
            run_verify(divisor, Candidate::new(multiplier, shift), &solver, &screen)
                .map_err(|e| format!("Error during verification: {}", e))
        }
        Commands::Scaled {
            divisor,
            solver,
            scale,
        } => {
            let divisor = parse_divisor(divisor, solver.width);
            run_scaled(divisor, &solver, scale)
                .map_err(|e| format!("Error in scaled variant: {}", e))
        }
        Commands::Formula {
            divisor,
            width,
            kind,
            min,
            max,
            multiplier,
            shift,
            scale,
        } => {
            let divisor = parse_divisor(divisor, width);
            let bound = match (min, max) {
                (Some(min), Some(max)) if u128::from(min) <= max => {
                    Some(MultiplierRange::new(u128::from(min), max))
                }
                (Some(min), Some(max)) => {
                    eprintln!("Error: --min {} is above --max {}", min, max);
                    std::process::exit(EXIT_FAILURE);
                }
                _ => None,
            };
            let candidate = match (multiplier, shift) {
                (Some(m), Some(s)) => Some(Candidate::new(m, s)),
                _ => None,
            };
            let options = FormulaOptions {
                kind,
                bound,
                candidate,
                scale,
            };
            run_formula(divisor, &options)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}
