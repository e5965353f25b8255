pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bingo")]
#[command(about = "Classroom bingo tracker with a weight countdown calendar")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "bingo.toml")]
    pub config: String,

    /// Class roster to work on (overrides tracker.class_id)
    #[arg(long)]
    pub class_id: Option<String>,

    /// Directory holding the slot files (overrides tracker.data_dir)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Calendar sync URL (overrides sync.endpoint)
    #[arg(long)]
    pub sync_endpoint: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: TrackerCommand,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> toml_config::Overrides {
        toml_config::Overrides {
            class_id: self.class_id.clone(),
            data_dir: self.data_dir.clone(),
            sync_endpoint: self.sync_endpoint.clone(),
        }
    }

    /// The default file may be absent, an explicit one may not.
    pub fn config_required(&self) -> bool {
        self.config != "bingo.toml"
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Args)]
pub struct AdminArgs {
    /// Admin password; prompted for when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum TrackerCommand {
    #[command(flatten)]
    Bingo(BingoCommand),
    /// Weight countdown calendar
    #[command(subcommand)]
    Weight(WeightCommand),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum BingoCommand {
    /// Ranked leaderboard with totals
    List,
    /// Show the 5x5 map for one student
    Map { student: String },
    /// Write the leaderboard to a CSV file
    Export { path: String },
    /// Add a student
    Add {
        name: String,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Remove a student
    Remove {
        student: String,
        /// Skip the confirmation question
        #[arg(short, long)]
        yes: bool,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Record one collected card
    Inc {
        student: String,
        position: u8,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Take back one card
    Dec {
        student: String,
        position: u8,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Add one student per line of a text or CSV file
    Import {
        file: String,
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Change the admin password
    Passwd {
        /// Current password; prompted for when omitted
        #[arg(long)]
        current_password: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[command(flatten)]
        admin: AdminArgs,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum WeightCommand {
    /// Record a weight for a day; a blank or non-positive value clears it
    Set { date: String, kg: String },
    /// Show one month (YYYY-MM), the current one by default
    Show {
        #[arg(long)]
        month: Option<String>,
    },
    /// Print BMI and category for a weight
    Bmi { kg: f64 },
    /// Pull remote entries and merge them over the local ones
    Sync,
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_weight_and_bingo_commands_parse_to_separate_arms() {
        let cli = CliConfig::try_parse_from(["bingo", "weight", "sync"]).unwrap();
        assert!(matches!(cli.command, TrackerCommand::Weight(WeightCommand::Sync)));

        let cli = CliConfig::try_parse_from(["bingo", "--class-id", "3a", "list"]).unwrap();
        assert!(matches!(cli.command, TrackerCommand::Bingo(BingoCommand::List)));
        assert_eq!(cli.overrides().class_id.as_deref(), Some("3a"));

        let cli = CliConfig::try_parse_from(["bingo", "inc", "Amy", "7", "--password", "admin"]).unwrap();
        match cli.command {
            TrackerCommand::Bingo(BingoCommand::Inc { student, position, admin }) => {
                assert_eq!(student, "Amy");
                assert_eq!(position, 7);
                assert_eq!(admin.password.as_deref(), Some("admin"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_passwd_takes_current_and_new_separately() {
        let cli = CliConfig::try_parse_from([
            "bingo",
            "passwd",
            "--password",
            "admin",
            "--current-password",
            "admin",
            "--new-password",
            "chalk",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            TrackerCommand::Bingo(BingoCommand::Passwd { ref current_password, .. })
                if current_password.as_deref() == Some("admin")
        ));
    }
}
