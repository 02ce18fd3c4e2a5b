#![allow(clippy::cast_precision_loss)]

use cdcl_sat::sat::clause_management::ClauseManagementType;
use cdcl_sat::sat::cnf::Cnf;
use cdcl_sat::sat::dimacs::{parse_dimacs, parse_file};
use cdcl_sat::sat::error::ParseError;
use cdcl_sat::sat::restarter::RestarterType;
use cdcl_sat::sat::solver::{
    SolutionStats, Solver, SolverConfig, SolverImpls, SolverType, Verdict,
};
use cdcl_sat::sat::targets;
use cdcl_sat::sat::variable_selection::HeuristicType;
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Literals per `v` line of a printed model.
const MODEL_LINE_WIDTH: usize = 10;

/// Defines the command-line interface for the solver.
#[derive(Parser, Debug)]
#[command(name = "cdcl-sat", version, about = "A conflict-driven clause learning SAT solver")]
pub(crate) struct Cli {
    /// A DIMACS file, or a directory searched recursively for `.cnf` files, solved when
    /// no subcommand is given.
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        #[arg(short = 'f', long = "path", value_name = "PATH")]
        file: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve DIMACS text given on the command line, e.g. "1 -2 0 2 3 0".
    Text {
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by every way of solving.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Log at debug level (unless `RUST_LOG` is set) and dump the final trail and clauses.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check a found model against the formula.
    #[arg(long, default_value_t = false)]
    pub(crate) verify: bool,

    /// Print problem and search statistics.
    #[arg(long, default_value_t = false)]
    pub(crate) stats: bool,

    /// Print the model as `v` lines.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    #[arg(long, default_value_t = SolverType::Cdcl)]
    pub(crate) solver: SolverType,

    /// Branching heuristic; defaults to vsids for cdcl and mom for dpll.
    #[arg(long)]
    pub(crate) heuristic: Option<HeuristicType>,

    /// Factor applied to VSIDS activities at each decay.
    #[arg(long, default_value_t = 0.95)]
    pub(crate) vsids_decay: f64,

    /// Decisions between VSIDS decays.
    #[arg(long, default_value_t = 256)]
    pub(crate) vsids_period: usize,

    #[arg(long, default_value_t = RestarterType::Never)]
    pub(crate) restarts: RestarterType,

    /// Conflicts per Luby unit.
    #[arg(long, default_value_t = 100)]
    pub(crate) luby_unit: usize,

    #[arg(long, default_value_t = ClauseManagementType::None)]
    pub(crate) clause_management: ClauseManagementType,

    /// Learned clause count that triggers a database clean.
    #[arg(long, default_value_t = 20_000)]
    pub(crate) max_learned: usize,

    /// Time budget per formula in seconds; 0 disables it.
    #[arg(long, default_value_t = 60)]
    pub(crate) timeout: u64,

    #[arg(long, default_value_t = false)]
    pub(crate) no_pure_literals: bool,

    #[arg(long, default_value_t = false)]
    pub(crate) eliminate_variables: bool,
}

impl CommonOptions {
    pub(crate) fn config(&self) -> SolverConfig {
        let config = SolverConfig::default()
            .with_vsids(self.vsids_decay, self.vsids_period)
            .with_restarts(self.restarts)
            .with_luby_unit(self.luby_unit)
            .with_clause_management(self.clause_management)
            .with_max_learned(self.max_learned)
            .with_timeout((self.timeout > 0).then(|| Duration::from_secs(self.timeout)))
            .with_pure_literals(!self.no_pure_literals)
            .with_variable_elimination(self.eliminate_variables);
        match self.heuristic {
            Some(heuristic) => config.with_heuristic(heuristic),
            None => config,
        }
    }
}

/// Process exit status for a verdict, following the SAT competition convention.
pub(crate) const fn exit_code(verdict: &Verdict) -> i32 {
    match verdict {
        Verdict::Satisfiable(_) => 10,
        Verdict::Unsatisfiable => 20,
        Verdict::Unknown => 0,
    }
}

/// Parses and solves one DIMACS file.
///
/// # Errors
///
/// If the file cannot be read or is not valid DIMACS.
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<Verdict, ParseError> {
    let time = Instant::now();
    let cnf = parse_file(path)?;
    let parse_time = time.elapsed();

    let mut solver = common.solver.to_impl(&cnf, common.config());
    Ok(solve_and_report(&mut solver, &cnf, common, Some(path), parse_time))
}

/// Parses and solves DIMACS text.
///
/// # Errors
///
/// If the text is not valid DIMACS.
pub(crate) fn solve_text(input: &str, common: &CommonOptions) -> Result<Verdict, ParseError> {
    let time = Instant::now();
    let cnf = parse_dimacs(input.as_bytes())?;
    let parse_time = time.elapsed();

    let mut solver = common.solver.to_impl(&cnf, common.config());
    Ok(solve_and_report(&mut solver, &cnf, common, None, parse_time))
}

/// Solves every `.cnf` file below `path`, reusing one engine. Files that fail to
/// parse are reported and skipped.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) {
    let mut solver: Option<SolverImpls> = None;
    let mut solved = 0_usize;

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !entry.file_type().is_file() || file_path.extension().is_none_or(|ext| ext != "cnf") {
            continue;
        }

        let time = Instant::now();
        let cnf = match parse_file(file_path) {
            Ok(cnf) => cnf,
            Err(e) => {
                eprintln!("{}: {e}", file_path.display());
                continue;
            }
        };
        let parse_time = time.elapsed();

        let fresh = solver.is_none();
        let engine = solver.get_or_insert_with(|| common.solver.to_impl(&cnf, common.config()));
        if !fresh {
            engine.load(&cnf);
        }
        solve_and_report(engine, &cnf, common, Some(file_path), parse_time);
        solved += 1;
    }

    info!(target: targets::DRIVER, "solved {solved} files under {}", path.display());
}

/// Checks a model against the formula.
pub(crate) fn verify_solution(cnf: &Cnf, verdict: &Verdict) {
    if let Some(model) = verdict.solutions() {
        let ok = cnf.verify(model);
        println!("c verified: {ok}");
        if !ok {
            eprintln!("model does not satisfy the formula");
        }
    }
}

/// Runs the solver on its loaded formula and prints everything `common` asks for.
pub(crate) fn solve_and_report(
    solver: &mut SolverImpls,
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Verdict {
    if let Some(name) = label {
        println!("c solving {}", name.display());
    }
    debug!(
        target: targets::DRIVER,
        "{} with {} variables, {} clauses, {} literals",
        common.solver,
        cnf.num_vars,
        cnf.len(),
        cnf.literal_count()
    );

    let time = Instant::now();
    let verdict = solver.solve();
    let elapsed = time.elapsed();
    info!(target: targets::DRIVER, "{verdict} in {elapsed:?}");

    if common.debug {
        dump_state(solver);
    }
    if common.verify {
        verify_solution(cnf, &verdict);
    }
    if common.stats {
        print_stats(parse_time, elapsed, cnf, solver);
    }

    println!("s {verdict}");
    if common.print_solution {
        if let Some(model) = verdict.solutions() {
            print_model(model.literals().map(i32::from));
        }
    }
    verdict
}

fn dump_state(solver: &SolverImpls) {
    let state = solver.state();
    println!("c trail: {}", state.trail_snapshot().iter().join("-"));
    for clause in state.clause_snapshot() {
        println!("c {clause}");
    }
}

/// Prints a model in competition format.
pub(crate) fn print_model(literals: impl Iterator<Item = i32>) {
    for chunk in &literals.chunks(MODEL_LINE_WIDTH) {
        println!("v {}", chunk.format(" "));
    }
    println!("v 0");
}

/// Allocated and resident memory in MiB, if jemalloc can report them.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::read().ok()?;
    let resident = stats::resident::read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

pub(crate) fn print_stats(parse_time: Duration, elapsed: Duration, cnf: &Cnf, solver: &SolverImpls) {
    let s: SolutionStats = solver.stats();
    let elapsed_secs = elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses (original)", cnf.len());
    stat_line("Literals (original)", cnf.literal_count());
    stat_line("Eliminated variables", s.eliminated_variables);

    println!("========================[ Search Statistics ]========================");
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line("Removed clauses", s.removed_clauses);
    stat_line("Live clauses (incl. learnt)", solver.state().clauses().len());
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Restarts", s.restarts, elapsed_secs);
    if let Some((allocated, resident)) = memory_usage() {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdcl_sat::sat::assignment::Solutions;

    fn options(args: &[&str]) -> CommonOptions {
        let cli = Cli::parse_from(std::iter::once("cdcl-sat").chain(args.iter().copied()));
        cli.common
    }

    #[test]
    fn test_defaults_map_to_config() {
        let config = options(&[]).config();
        assert_eq!(config.heuristic, None);
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert!(config.pure_literals);
        assert!(!config.variable_elimination);
        assert_eq!(config, SolverConfig::default().with_timeout(Some(Duration::from_secs(60))));
    }

    #[test]
    fn test_flags_map_to_config() {
        let config = options(&[
            "--heuristic",
            "mom",
            "--restarts",
            "luby",
            "--timeout",
            "0",
            "--no-pure-literals",
            "--eliminate-variables",
            "--clause-management",
            "activity",
        ])
        .config();
        assert_eq!(config.heuristic, Some(HeuristicType::Mom));
        assert_eq!(config.restarts, RestarterType::Luby);
        assert_eq!(config.clause_management, ClauseManagementType::Activity);
        assert_eq!(config.timeout, None);
        assert!(!config.pure_literals);
        assert!(config.variable_elimination);
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::parse_from(["cdcl-sat", "text", "--input", "1 0", "--solver", "dpll"]);
        let Some(Commands::Text { input, common }) = cli.command else {
            panic!("expected text command");
        };
        assert_eq!(input, "1 0");
        assert_eq!(common.solver, SolverType::Dpll);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Verdict::Satisfiable(Solutions::new(1))), 10);
        assert_eq!(exit_code(&Verdict::Unsatisfiable), 20);
        assert_eq!(exit_code(&Verdict::Unknown), 0);
    }

    #[test]
    fn test_solve_text() {
        let common = options(&["--verify"]);
        assert!(solve_text("p cnf 2 2\n1 2 0\n-1 0\n", &common).unwrap().is_sat());
        assert!(solve_text("1 0 -1 0", &common).unwrap().is_unsat());
        assert!(solve_text("1 x 0", &common).is_err());
    }
}
