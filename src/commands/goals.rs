use super::{
    ExecutableCommand, OutputArgs, OutputFormat,
    clients::ListArgs,
    import::{ImportReport, read_records},
    output::{print_many, print_one},
};
use crate::{
    Error, Result, State,
    forms::{GoalField, GoalForm, validate_goal},
    model::{GoalInput, GoalInputBuilder},
    resources::{GoalsResource, view},
};
use camino::Utf8PathBuf;
use clap::{Args, Subcommand};
use clap_complete::{ArgValueCompleter, PathCompleter};
use log::warn;
use rust_decimal::Decimal;

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum GoalCommands {
    /// List goals, optionally for one client.
    #[command(alias = "ls")]
    List(ListGoalsCommand),
    /// Show one goal.
    Get(GetGoalCommand),
    /// Create a goal for a client.
    #[command(aliases = ["a", "new", "create"])]
    Add(AddGoalCommand),
    /// Rename a goal or change its target amount.
    Update(UpdateGoalCommand),
    /// Delete goal(s).
    #[command(aliases = ["rm", "delete"])]
    Remove(RemoveGoalCommand),
    /// Create goals from a file.
    Import(ImportGoalsCommand),
}

impl ExecutableCommand for GoalCommands {
    async fn execute(self, state: &mut State) -> Result<()> {
        match self {
            Self::List(cmd) => cmd.execute(state).await,
            Self::Get(cmd) => cmd.execute(state).await,
            Self::Add(cmd) => cmd.execute(state).await,
            Self::Update(cmd) => cmd.execute(state).await,
            Self::Remove(cmd) => cmd.execute(state).await,
            Self::Import(cmd) => cmd.execute(state).await,
        }
    }
}

#[derive(Debug, Args)]
pub struct ListGoalsCommand {
    #[arg(short, long)]
    /// Only goals belonging to this client.
    pub client: Option<i64>,
    #[command(flatten)]
    pub list: ListArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for ListGoalsCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let mut goals = GoalsResource::new(state.api());
        let all = match self.client {
            Some(client_id) => goals.by_client(client_id).await?,
            None => {
                goals.refetch().await;
                if let Some(error) = goals.state().error() {
                    return Err(Error::simple(error));
                }
                goals.goals().to_vec()
            }
        };
        let limit = self.list.limit(state, all.len());
        let page = view(&all, &self.list.filter(), self.list.page, limit);
        print_many(&page.items, self.output.format)?;
        if self.output.format == OutputFormat::Table {
            println!("{}", page.pagination);
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct GetGoalCommand {
    pub id: i64,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for GetGoalCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let goals = GoalsResource::new(state.api());
        let goal = goals.get(self.id).await?;
        print_one(&goal, self.output.format)
    }
}

#[derive(Debug, Args)]
pub struct AddGoalCommand {
    /// The client the goal belongs to.
    pub client_id: i64,
    /// What the client is saving for.
    pub goal_name: String,
    /// The target amount.
    pub goal_amount: Decimal,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl_into_builder! {
    AddGoalCommand => GoalInputBuilder {
        required: (goal_name),
        copy: (client_id, goal_amount),
    }
}

impl ExecutableCommand for AddGoalCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let format = self.output.format;
        let input = GoalInputBuilder::from(self).build()?;
        validate_goal(&input)?;
        let mut goals = GoalsResource::new(state.api());
        let created = goals.create(input).await?;
        print_one(&created, format)
    }
}

#[derive(Debug, Args)]
pub struct UpdateGoalCommand {
    pub id: i64,
    #[arg(short = 'n', long)]
    pub goal_name: Option<String>,
    #[arg(short = 'a', long)]
    pub goal_amount: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for UpdateGoalCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let mut goals = GoalsResource::new(state.api());
        let existing = goals.get(self.id).await?;
        let mut form = GoalForm::editing(&existing);
        if let Some(name) = self.goal_name {
            form.set_field(GoalField::GoalName, name);
        }
        if let Some(amount) = self.goal_amount {
            form.set_field(GoalField::GoalAmount, amount);
        }
        let mut input = None;
        if !form.submit(|values| input = Some(values)) {
            return form.errors().clone().into_result();
        }
        let Some(input) = input else {
            return Ok(());
        };
        let updated = goals.update(self.id, input).await?;
        print_one(&updated, self.output.format)
    }
}

#[derive(Debug, Args)]
pub struct RemoveGoalCommand {
    /// The goal(s) to delete.
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

impl ExecutableCommand for RemoveGoalCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        println!("Removing {} goal(s).", self.ids.len());
        let mut goals = GoalsResource::new(state.api());
        for id in self.ids {
            if !goals.delete(id).await? {
                println!("Goal {id} was not deleted.");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ImportGoalsCommand {
    #[arg(add = ArgValueCompleter::new(PathCompleter::file()))]
    /// The csv, yaml or jsonl file to import goals from.
    pub file: Utf8PathBuf,
}

impl ExecutableCommand for ImportGoalsCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        println!("Reading file: {}", self.file);
        let inputs: Vec<GoalInput> = read_records(&self.file)?;
        println!("Importing {} goal(s).", inputs.len());
        let mut goals = GoalsResource::new(state.api());
        let mut report = ImportReport::default();
        for input in inputs {
            if let Err(e) = validate_goal(&input) {
                println!("Skipping {}: {e}", input.goal_name);
                report.skipped += 1;
                continue;
            }
            match goals.create(input).await {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    warn!("Import failed: {e}");
                    report.skipped += 1;
                }
            }
        }
        println!(
            "Imported {} goal(s), skipped {}.",
            report.imported, report.skipped
        );
        Ok(())
    }
}
