use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Rehearses custom stage imports against a simulated game host",
    version
)]
pub struct Args {
    /// Mod folder holding the import descriptor and its assets directory
    #[arg(long, default_value = "mod")]
    pub mod_root: PathBuf,

    /// Level id to rehearse (repeatable; default: every pending import)
    #[arg(long = "level")]
    pub levels: Vec<i32>,

    /// Frames to simulate per level
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Vertical units the protagonist drops per simulated frame
    #[arg(long, default_value_t = 1.0)]
    pub descent: f32,

    /// Character id the host reports while requests register and rehearse
    #[arg(long, default_value_t = 0)]
    pub character: i32,

    /// Path to write the rehearsal report JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// List the parsed import requests without rehearsing
    #[arg(long)]
    pub list_imports: bool,

    /// Print per-request and per-stage detail instead of the compact view
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Command {
    Inspect(InspectArgs),
    Rehearse(RehearseArgs),
}

#[derive(Debug)]
pub struct InspectArgs {
    pub mod_root: PathBuf,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct RehearseArgs {
    pub mod_root: PathBuf,
    pub levels: Vec<i32>,
    pub frames: u32,
    pub descent: f32,
    pub character: i32,
    pub report_json: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    fn into_command(self) -> Result<Command> {
        if self.list_imports {
            if self.report_json.is_some() {
                bail!("--report-json requires a rehearsal run");
            }
            return Ok(Command::Inspect(InspectArgs {
                mod_root: self.mod_root,
                verbose: self.verbose,
            }));
        }

        if self.frames == 0 {
            bail!("--frames must be at least 1");
        }

        Ok(Command::Rehearse(RehearseArgs {
            mod_root: self.mod_root,
            levels: self.levels,
            frames: self.frames,
            descent: self.descent,
            character: self.character,
            report_json: self.report_json,
            verbose: self.verbose,
        }))
    }
}
