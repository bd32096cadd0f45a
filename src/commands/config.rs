use super::{OutputArgs, OutputFormat, output::print_value};
use crate::{CONFIG_FILE_PATH, Config, Result, SESSION_FILE_PATH};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum ConfigCommands {
    /// Print the configuration in effect, environment overrides included.
    Show(OutputArgs),
    /// Print where the configuration and session are kept.
    Path,
    /// Write the default configuration file.
    Init(InitConfigCommand),
}

#[derive(Debug, Args)]
pub struct InitConfigCommand {
    #[arg(short, long)]
    /// Overwrite an existing file.
    pub force: bool,
}

impl ConfigCommands {
    pub fn run(self) -> Result<()> {
        match self {
            Self::Show(output) => {
                let config = Config::load()?;
                let format = match output.format {
                    OutputFormat::Table => OutputFormat::Yaml,
                    format => format,
                };
                print_value(&config, format)
            }
            Self::Path => {
                println!("config:  {}", *CONFIG_FILE_PATH);
                println!("session: {}", *SESSION_FILE_PATH);
                Ok(())
            }
            Self::Init(InitConfigCommand { force }) => {
                if CONFIG_FILE_PATH.exists() && !force {
                    println!("{} already exists; use --force to overwrite it.", *CONFIG_FILE_PATH);
                    return Ok(());
                }
                Config::default().save()?;
                println!("Wrote {}", *CONFIG_FILE_PATH);
                Ok(())
            }
        }
    }
}
