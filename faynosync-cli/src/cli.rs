use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(
    name = "faynosync",
    version,
    about = "Upload application builds to a faynoSync server",
    long_about = None
)]
pub struct Cli {
    /// Log level: trace, debug, info, warn or error
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the settings file interactively
    Init,

    /// View or change stored settings
    Config {
        #[clap(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Upload one or more files with release metadata
    #[clap(disable_help_flag = true)]
    Upload {
        /// Upload flags, see `faynosync upload --help`
        #[clap(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        args: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the settings file
    View,

    /// Set `server` or `owner`, prompting when no value is given
    Set {
        #[clap(value_name = "server|owner")]
        key: String,
        value: Option<String>,
    },
}

pub const UPLOAD_USAGE: &str = "\
faynosync upload

Usage:
  faynosync upload [flags]

Upload flags:
  --app <name>
  --file <path>          may be specified multiple times
  --version <value>
  --channel <value>
  --platform <value>
  --arch <value>
  --publish[=true|false]
  --critical[=true|false]
  --intermediate[=true|false]
  --changelog <text>
  --changelog-file <path>
  --changelog-stdin[=true|false]";
