//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Vibe CLI - typed access to Vibe collections from the terminal
///
/// Lists, reads and edits collection records and admin resources through
/// either the direct REST API or the signed proxy.
#[derive(Parser, Debug)]
#[command(
    name = "vibe",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides; each one beats the config file and environment
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Backend base URL for direct mode
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Proxy host; enables proxy mode. Pass an empty string to force direct mode
    #[arg(long, global = true, value_name = "URL")]
    pub idp_url: Option<String>,

    /// Client id sent to the proxy
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Base64-encoded proxy signing key
    #[arg(long, global = true)]
    pub signing_key: Option<String>,

    /// Collection group used in proxy mode
    #[arg(long, global = true)]
    pub collection_group: Option<String>,

    /// Request deadline in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Bearer token for authenticated calls
    #[arg(long, global = true, env = "VIBE_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log every request and response
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List records in a collection
    List(ListArgs),

    /// Fetch one record by id
    Get(GetArgs),

    /// Create a record from a JSON document
    Create(CreateArgs),

    /// Apply a partial update to a record
    Update(UpdateArgs),

    /// Delete a record
    Delete(DeleteArgs),

    /// Manage roles, users and the tenant
    Admin(AdminArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Caller-side retry settings
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RetryArgs {
    /// Retry network, rate-limit and server errors up to N times
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub retries: u32,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Collection name
    pub collection: String,

    /// Page size
    #[arg(long, default_value_t = 20)]
    pub limit: u64,

    /// Number of records to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Field to sort by
    #[arg(long)]
    pub order_by: Option<String>,

    /// Sort direction
    #[arg(long, value_enum, requires = "order_by")]
    pub order_dir: Option<OrderDir>,

    /// Filter as `field=value` or `field:operator=value` (repeatable)
    #[arg(long = "filter", value_name = "FILTER")]
    pub filters: Vec<String>,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Collection name
    pub collection: String,

    /// Record id
    pub id: String,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Collection name
    pub collection: String,

    /// JSON document, or `@path` to read it from a file
    #[arg(value_name = "JSON")]
    pub data: String,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Arguments for the update command
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Collection name
    pub collection: String,

    /// Record id
    pub id: String,

    /// Partial JSON document, or `@path` to read it from a file
    #[arg(value_name = "JSON")]
    pub data: String,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Collection name
    pub collection: String,

    /// Record id
    pub id: String,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Arguments for the admin command
#[derive(Parser, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub resource: AdminResource,
}

/// Admin resources
#[derive(Subcommand, Debug)]
pub enum AdminResource {
    /// Tenant roles
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// Tenant users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// The tenant record
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoleAction {
    /// List roles
    List,
    /// Create a role from a JSON document
    Create {
        #[arg(value_name = "JSON")]
        data: String,
    },
    /// Update a role
    Update {
        id: String,
        #[arg(value_name = "JSON")]
        data: String,
    },
    /// Delete a role
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// List users
    List,
    /// Show one user
    Get { id: String },
    /// Update a user
    Update {
        id: String,
        #[arg(value_name = "JSON")]
        data: String,
    },
    /// Remove a user from the tenant
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TenantAction {
    /// Show the tenant record
    Show,
    /// Update the tenant record
    Update {
        #[arg(value_name = "JSON")]
        data: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective client configuration (secrets redacted)
    Show,

    /// Show which configuration file is used and where files are searched
    Path,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Sort direction
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderDir {
    Asc,
    Desc,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<OrderDir> for vibe_core::OrderDirection {
    fn from(dir: OrderDir) -> Self {
        match dir {
            OrderDir::Asc => vibe_core::OrderDirection::Asc,
            OrderDir::Desc => vibe_core::OrderDirection::Desc,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["vibe", "-vv", "get", "todos", "1"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["vibe", "--quiet", "get", "todos", "1"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_list_arguments() {
        let cli = Cli::parse_from([
            "vibe",
            "list",
            "todos",
            "--limit",
            "10",
            "--offset",
            "25",
            "--order-by",
            "title",
            "--order-dir",
            "desc",
            "--filter",
            "done=false",
            "--filter",
            "priority:gte=2",
            "--retries",
            "3",
        ]);
        let Commands::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(args.collection, "todos");
        assert_eq!(args.limit, 10);
        assert_eq!(args.offset, 25);
        assert_eq!(args.order_dir, Some(OrderDir::Desc));
        assert_eq!(args.filters, vec!["done=false", "priority:gte=2"]);
        assert_eq!(args.retry.retries, 3);
    }

    #[test]
    fn test_global_connection_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "vibe",
            "delete",
            "todos",
            "7",
            "--idp-url",
            "",
            "--timeout-ms",
            "500",
            "--debug",
        ]);
        assert_eq!(cli.connection.idp_url.as_deref(), Some(""));
        assert_eq!(cli.connection.timeout_ms, Some(500));
        assert!(cli.connection.debug);
    }

    #[test]
    fn test_admin_subcommands() {
        let cli = Cli::parse_from(["vibe", "admin", "users", "remove", "u1"]);
        assert!(matches!(
            cli.command,
            Commands::Admin(AdminArgs {
                resource: AdminResource::Users {
                    action: UserAction::Remove { .. }
                }
            })
        ));
    }
}
