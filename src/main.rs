use clap::CommandFactory;
use clap_complete::CompleteEnv;
use client_goals::{Cli, Result};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    CompleteEnv::with_factory(Cli::command).complete();
    pretty_env_logger::init();
    color_backtrace::install();
    Cli::default().execute().await
}
