use crate::settings::ThemeChoice;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path (JSON or TOML)
    #[arg(short, long, env = "PROXMOX_MCP_CONFIG")]
    pub config: Option<String>,

    /// Log level (error, warn, info, debug, trace); overrides logging.level
    #[arg(short = 'L', long)]
    pub log_level: Option<String>,

    /// Output theme; overrides display.theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeArg {
    Auto,
    Emoji,
    Plain,
}

impl From<ThemeArg> for ThemeChoice {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Auto => ThemeChoice::Auto,
            ThemeArg::Emoji => ThemeChoice::Emoji,
            ThemeArg::Plain => ThemeChoice::Plain,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,
    /// Print the tool catalogue as JSON and exit
    Tools,
    /// Generate shell completion scripts
    Completions {
        /// The shell to generate the script for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_no_subcommand() {
        let args = Args::try_parse_from(["proxmox-mcp-bridge", "-c", "cfg.json"]).unwrap();
        assert_eq!(args.command, None);
        assert_eq!(args.config.as_deref(), Some("cfg.json"));
    }

    #[test]
    fn test_overrides_and_subcommands() {
        let args =
            Args::try_parse_from(["proxmox-mcp-bridge", "-L", "debug", "--theme", "plain", "tools"])
                .unwrap();
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.theme.map(ThemeChoice::from), Some(ThemeChoice::Plain));
        assert_eq!(args.command, Some(Commands::Tools));

        let args = Args::try_parse_from(["proxmox-mcp-bridge", "completions", "bash"]).unwrap();
        assert_eq!(args.command, Some(Commands::Completions { shell: Shell::Bash }));
    }
}
