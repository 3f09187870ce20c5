use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE_MESSAGE: &str = "Usage: geo2csv \"CITY_NAME\"";

#[derive(Debug, Clone, Parser)]
#[command(name = "geo2csv")]
#[command(about = "Look up a place name and write the suggested locations to CSV")]
pub struct CliArgs {
    /// Path to a TOML configuration file (defaults to ./geo2csv.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Location to look up; quotes are optional and several words are joined with spaces
    #[arg(
        value_name = "LOCATION",
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub location: Vec<OsString>,
}
