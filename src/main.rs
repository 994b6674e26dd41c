//! sdeps - dependency graphs for construction schedules

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = schedule_deps::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
