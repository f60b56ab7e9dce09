//! desk - contracts, orders and purchase requests from the terminal

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = contract_desk::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
