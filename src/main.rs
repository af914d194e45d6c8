mod cli;
mod cli_help;
mod config;
mod lang;
mod parse;
mod patterns;
mod report_helpers;
mod util;
mod walk;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{CommandFactory, Parser};
use clap_complete::generate;

use cli::{Cli, Commands};
use config::ConfigOverlay;
use patterns::{RunOptions, Severity};

/// Set by the interrupt handler; the scan checks it between batches and
/// finishes with a partial, internally consistent result.
static CANCELLED: AtomicBool = AtomicBool::new(false);

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            common,
            report,
            show_all,
            min_similarity,
            min_lines,
            batch_size,
            exhaustive,
            min_shared_tokens,
            max_candidates,
            no_stream,
            no_progress,
            include,
            exclude,
            fail_on,
        } => {
            if let Err(err) = ctrlc::set_handler(|| CANCELLED.store(true, Ordering::Relaxed)) {
                eprintln!("warning: could not install interrupt handler: {err}");
            }

            let target = common.path.unwrap_or_else(|| PathBuf::from("."));
            let overlay = ConfigOverlay {
                min_similarity,
                min_lines,
                batch_size,
                approx: exhaustive.then_some(false),
                min_shared_tokens,
                max_candidates_per_block: max_candidates,
                stream_results: no_stream.then_some(false),
                include: (!include.is_empty()).then_some(include),
                exclude: (!exclude.is_empty()).then_some(exclude),
            };
            let options = RunOptions {
                json: common.json,
                detailed: report,
                show_all,
                include_tests: common.include_tests,
                no_progress,
            };
            let gate = fail_on.as_deref().and_then(Severity::parse);

            match patterns::run(&target, &overlay, &options, &CANCELLED) {
                Ok(status) => {
                    if let (Some(gate), Some(worst)) = (gate, status.worst_severity)
                        && worst >= gate
                    {
                        std::process::exit(2);
                    }
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "gemelo", &mut std::io::stdout());
        }
    }
}
