#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! # cdcl-sat
//!
//! Command-line front end for the solver in the `cdcl_sat` library.
//!
//! ```sh
//! # Solve one DIMACS file with the default CDCL engine
//! cdcl-sat problem.cnf
//!
//! # Solve every .cnf file below a directory, with statistics
//! cdcl-sat benchmarks/ --stats
//!
//! # DPLL with debug logging, checking the model
//! cdcl-sat file --path problem.cnf --solver dpll --debug --verify
//!
//! # A formula given inline
//! cdcl-sat text --input "1 2 0 -1 0" --print-solution
//!
//! # Shell completions
//! cdcl-sat completions zsh
//! ```
//!
//! A single formula exits with 10 when satisfiable, 20 when unsatisfiable and 0
//! when the time budget ran out. Directory runs exit with 0.

mod command_line;

use crate::command_line::cli::{
    exit_code, solve_dir, solve_file, solve_text, Cli, Commands, CommonOptions,
};
use clap::{CommandFactory, Parser};
use log::LevelFilter;
use std::path::Path;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug && std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn run_path(path: &Path, common: &CommonOptions) -> i32 {
    if path.is_dir() {
        solve_dir(path, common);
        return 0;
    }
    match solve_file(path, common) {
        Ok(verdict) => exit_code(&verdict),
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Some(Commands::File { file, common }) => {
            init_logging(common.debug);
            run_path(&file, &common)
        }
        Some(Commands::Text { input, common }) => {
            init_logging(common.debug);
            match solve_text(&input, &common) {
                Ok(verdict) => exit_code(&verdict),
                Err(e) => {
                    eprintln!("invalid input: {e}");
                    1
                }
            }
        }
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            0
        }
        None => {
            init_logging(cli.common.debug);
            if let Some(path) = cli.path {
                run_path(&path, &cli.common)
            } else {
                eprintln!("no input given; pass a path or a subcommand, see --help");
                2
            }
        }
    };

    std::process::exit(code);
}
