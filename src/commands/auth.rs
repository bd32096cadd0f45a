use super::{ExecutableCommand, OutputArgs, output::print_value};
use crate::{Result, State};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum AuthCommands {
    /// Log in and remember the session.
    Login(LoginCommand),
    /// Create an account and log in with it.
    Register(RegisterCommand),
    /// Forget the stored session.
    Logout,
    /// Show who is logged in.
    #[command(alias = "status")]
    Whoami(OutputArgs),
}

impl ExecutableCommand for AuthCommands {
    async fn execute(self, state: &mut State) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(state).await,
            Self::Register(cmd) => cmd.execute(state).await,
            Self::Logout => {
                state.logout()?;
                println!("Logged out.");
                Ok(())
            }
            Self::Whoami(output) => whoami(state, output),
        }
    }
}

/// Reads one line from stdin after printing `label`.
pub(crate) fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(String::from(line.trim_end_matches(['\r', '\n'])))
}

#[derive(Debug, Args)]
pub struct LoginCommand {
    #[arg(short, long)]
    /// Read from stdin when not given.
    pub password: Option<String>,
    pub username: String,
}

impl ExecutableCommand for LoginCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let password = match self.password {
            Some(password) => password,
            None => prompt("Password")?,
        };
        state.login(self.username, password).await?;
        if let Some(user) = state.session().user() {
            println!("Logged in as {} ({}).", user.username(), user.role());
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct RegisterCommand {
    #[arg(short, long)]
    /// Read from stdin when not given.
    pub password: Option<String>,
    pub username: String,
    pub email: String,
}

impl ExecutableCommand for RegisterCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let password = match self.password {
            Some(password) => password,
            None => prompt("Password")?,
        };
        state.register(self.username, self.email, password).await?;
        if let Some(user) = state.session().user() {
            println!("Registered and logged in as {}.", user.username());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct WhoAmI<'a> {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
}

fn whoami(state: &State, output: OutputArgs) -> Result<()> {
    let session = state.session().session();
    let info = WhoAmI {
        authenticated: session.is_some(),
        username: session.map(|s| s.user().username().as_str()),
        role: session.map(|s| s.user().role().as_str()),
        since: session.and_then(|s| s.established_at().format(&Rfc3339).ok()),
    };
    print_value(&info, output.format)
}
