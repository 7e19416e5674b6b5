use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use solace_core::VERSION;

/// Solace - an encrypted journal and mood tracker that works offline
#[derive(Parser)]
#[command(name = "solace")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "SOLACE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the config and the local store
    Init(InitArgs),

    /// Show backend mode, key mode and migration state
    Status,

    /// Write and read journal entries
    #[command(subcommand)]
    Journal(JournalSubcommand),

    /// Daily mood check-ins
    #[command(subcommand)]
    Mood(MoodSubcommand),

    /// Show and change user settings
    #[command(subcommand)]
    Settings(SettingsSubcommand),

    /// Copy local data to the remote store and switch to it
    Migrate(MigrateArgs),

    /// Password protection for the journal key
    #[command(subcommand)]
    Password(PasswordSubcommand),

    /// Delete the journal key (existing entries become unreadable)
    ResetKey(ResetKeyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct InitArgs {
    /// Path of the local store database
    #[arg(long, value_name = "PATH")]
    pub store: Option<String>,

    /// Directory of a shared remote store
    #[arg(long, value_name = "DIR")]
    pub remote: Option<String>,

    /// Account id used as the remote namespace (defaults to the device id)
    #[arg(long, value_name = "ID", requires = "remote")]
    pub user_id: Option<String>,

    /// Protect the journal key with a password
    #[arg(long)]
    pub password: bool,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum JournalSubcommand {
    /// Add a journal entry
    Add {
        /// Entry text (reads stdin when omitted)
        #[arg(value_name = "TEXT")]
        text: Option<String>,

        /// Attach a mood (1-5 or a label such as "good")
        #[arg(long, value_name = "MOOD")]
        mood: Option<String>,
    },

    /// List journal entries, newest first
    List {
        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum MoodSubcommand {
    /// Record today's mood (replaces an earlier check-in from today)
    Set {
        /// Mood (1-5 or a label such as "okay")
        #[arg(value_name = "MOOD")]
        mood: String,

        /// Link the check-in to a chat
        #[arg(long, value_name = "ID")]
        chat: Option<String>,
    },

    /// Show today's mood
    Today,

    /// Show mood history, oldest first
    History {
        /// Only show the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show current settings
    Show,

    /// Store the assistant API key (prompts when omitted)
    SetApiKey {
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },

    /// Set a preference (VALUE is parsed as JSON, falling back to a string)
    Set {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },
}

#[derive(Args)]
pub struct MigrateArgs {
    /// Switch to the remote store without copying local data
    #[arg(long)]
    pub skip: bool,
}

#[derive(Subcommand)]
pub enum PasswordSubcommand {
    /// Derive the journal key from a password from now on
    Enable,
}

#[derive(Args)]
pub struct ResetKeyArgs {
    /// Confirmation phrase for scripted use (must be RESET)
    #[arg(long, value_name = "PHRASE")]
    pub confirm: Option<String>,
}
