//! falco
#![deny(missing_docs)]

use anyhow::Result;
use clap::Parser;
use falco_wrap::utils::{init_logging, print_error_chain};
use falco_wrap::{Falco, SubCommand};
use std::process::ExitCode;

fn inner_main() -> Result<()> {
    let falco = Falco::parse();
    init_logging();
    match falco.subcmd {
        SubCommand::Run(run) => {
            run.execute()?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}
