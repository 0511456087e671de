use cmdtree::{CmdTreeError, DispatchError};
use colored::Colorize;
use std::process;

fn main() {
    if let Err(e) = cmdtree::cli::app::run() {
        // clap renders its own errors, including --help, with its own exit code
        if let CmdTreeError::Dispatch(DispatchError::Parse(parse)) = &e {
            if let Some(clap_err) = parse.downcast_ref::<clap::Error>() {
                clap_err.exit();
            }
        }
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
