use anyhow::Result;

mod builder;
mod cli;
mod config;
mod host;
mod installer;
mod locator;
mod orchestrator;
mod positions;
mod rehearsal;
mod request;
mod tables;

use cli::Command;

fn main() -> Result<()> {
    env_logger::init();

    match cli::parse()? {
        Command::Inspect(args) => rehearsal::inspect(args),
        Command::Rehearse(args) => rehearsal::execute(args),
    }
}
