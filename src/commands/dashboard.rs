use super::{ExecutableCommand, OutputArgs, output::print_dashboard};
use crate::{Result, State, client::FetchPolicy};
use clap::Args;

#[derive(Debug, Args)]
pub struct DashboardCommand {
    #[arg(short, long)]
    /// Skip the cache and ask both services again.
    pub refresh: bool,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for DashboardCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let policy = if self.refresh {
            FetchPolicy::NetworkOnly
        } else {
            FetchPolicy::CacheFirst
        };
        let dashboard = state.api().dashboard(policy).await?;
        print_dashboard(&dashboard, self.output.format)
    }
}
