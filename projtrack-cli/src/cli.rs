use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Keep track of personal projects and their tasks")]
pub struct Cli {
    /// Path to the projects CSV file
    #[clap(long)]
    pub projects_file: Option<PathBuf>,

    /// Path to the tasks CSV file
    #[clap(long)]
    pub tasks_file: Option<PathBuf>,

    /// YAML config file naming the store files
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Use plain line prompts even on a terminal
    #[clap(long)]
    pub plain: bool,

    /// More log output on stderr (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
