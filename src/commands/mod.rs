use crate::{Result, State};
use clap::Parser;

/// Maps a command's arguments onto an input builder, field by field.
macro_rules! impl_into_builder {
    (
        $type:ident => $builder:ident {
            required: ($($required:ident),*),
            copy: ($($copy:ident),*),
        }
    ) => {
        impl From<$type> for $builder {
            fn from(value: $type) -> Self {
                let mut builder = $builder::default();
                $(
                    builder.$required(value.$required);
                )*
                $(
                    builder.$copy(value.$copy);
                )*
                builder
            }
        }
        impl From<&$type> for $builder {
            fn from(value: &$type) -> Self {
                let mut builder = $builder::default();
                $(
                    builder.$required(value.$required.clone());
                )*
                $(
                    builder.$copy(value.$copy);
                )*
                builder
            }
        }
    };
}

pub mod auth;
pub use auth::AuthCommands;
pub mod browse;
pub use browse::BrowseCommands;
pub mod clients;
pub use clients::ClientCommands;
mod completion;
pub mod config;
pub use config::ConfigCommands;
pub mod dashboard;
pub use dashboard::DashboardCommand;
pub mod goals;
pub use goals::GoalCommands;
mod import;
pub mod output;
pub use output::{OutputArgs, OutputFormat};
pub mod query;
pub use query::QueryCommand;

#[derive(Debug, Parser)]
#[command(version, author)]
#[command(rename_all = "kebab")]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            // Config commands must work before the services are reachable.
            Commands::Config(cmd) => cmd.run(),
            command => {
                let mut state = State::load().await?;
                command.execute(&mut state).await
            }
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::parse()
    }
}

#[derive(Debug, Parser)]
pub enum Commands {
    /// Log in, register or check the current session.
    #[command(subcommand)]
    Auth(AuthCommands),
    /// Manage clients.
    #[command(subcommand, alias = "c")]
    Clients(ClientCommands),
    /// Manage goals.
    #[command(subcommand, alias = "g")]
    Goals(GoalCommands),
    /// Show totals and recent entries from both services.
    Dashboard(DashboardCommand),
    /// Send a raw GraphQL document.
    Query(QueryCommand),
    /// Search, sort and page through a list interactively.
    #[command(subcommand)]
    Browse(BrowseCommands),
    /// Inspect or create the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[allow(async_fn_in_trait)]
pub trait ExecutableCommand {
    async fn execute(self, state: &mut State) -> Result<()>;
}

impl ExecutableCommand for Commands {
    async fn execute(self, state: &mut State) -> Result<()> {
        match self {
            Self::Auth(cmd) => cmd.execute(state).await,
            Self::Clients(cmd) => cmd.execute(state).await,
            Self::Goals(cmd) => cmd.execute(state).await,
            Self::Dashboard(cmd) => cmd.execute(state).await,
            Self::Query(cmd) => cmd.execute(state).await,
            Self::Browse(cmd) => cmd.execute(state).await,
            Self::Config(cmd) => cmd.run(),
        }
    }
}
