use super::{
    ExecutableCommand, OutputArgs, OutputFormat,
    import::{ImportReport, read_records},
    output::{print_many, print_one},
};
use crate::{
    Error, Result, State,
    forms::{ClientField, ClientForm, validate_client},
    model::{ClientInput, ClientInputBuilder},
    resources::ClientsResource,
    search::{FilterState, SortOrder},
};
use camino::Utf8PathBuf;
use clap::{Args, Subcommand};
use clap_complete::{ArgValueCompleter, PathCompleter};
use log::warn;

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum ClientCommands {
    /// List clients, optionally filtered, sorted and paged.
    #[command(alias = "ls")]
    List(ListClientsCommand),
    /// Show one client.
    Get(GetClientCommand),
    /// Create a client.
    #[command(aliases = ["a", "new", "create"])]
    Add(AddClientCommand),
    /// Change a client's name or email.
    Update(UpdateClientCommand),
    /// Delete client(s).
    #[command(aliases = ["rm", "delete"])]
    Remove(RemoveClientCommand),
    /// Create clients from a file.
    Import(ImportClientsCommand),
}

impl ExecutableCommand for ClientCommands {
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

/// Search, sort and paging options shared by the list commands.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(short, long)]
    /// Only show entries containing this text (case-insensitive).
    pub search: Option<String>,
    #[arg(long)]
    /// Field to sort by.
    pub sort_by: Option<String>,
    #[arg(long, value_parser = parse_sort_order)]
    /// ASC or DESC.
    pub order: Option<SortOrder>,
    #[arg(short, long, default_value_t = 1)]
    pub page: u64,
    #[arg(short, long)]
    /// Entries per page; defaults to the configured page size.
    pub limit: Option<u64>,
    #[arg(long, conflicts_with_all = ["page", "limit"])]
    /// Print every matching entry on one page.
    pub all: bool,
}

pub(crate) fn parse_sort_order(value: &str) -> std::result::Result<SortOrder, String> {
    value
        .parse()
        .map_err(|_| format!("`{value}` is not ASC or DESC"))
}

impl ListArgs {
    pub fn filter(&self) -> FilterState {
        FilterState {
            search: self.search.clone().unwrap_or_default(),
            sort_by: self.sort_by.clone(),
            sort_order: self.order,
        }
    }

    pub fn limit(&self, state: &State, total: usize) -> u64 {
        if self.all {
            (total as u64).max(1)
        } else {
            self.limit.unwrap_or_else(|| state.config().page_size())
        }
    }
}

#[derive(Debug, Args)]
pub struct ListClientsCommand {
    #[command(flatten)]
    pub list: ListArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for ListClientsCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let mut clients = ClientsResource::new(state.api());
        clients.refetch().await;
        if let Some(error) = clients.state().error() {
            return Err(Error::simple(error));
        }
        let limit = self.list.limit(state, clients.clients().len());
        let page = clients.view(&self.list.filter(), self.list.page, limit);
        print_many(&page.items, self.output.format)?;
        if self.output.format == OutputFormat::Table {
            println!("{}", page.pagination);
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct GetClientCommand {
    pub id: i64,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for GetClientCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let clients = ClientsResource::new(state.api());
        let client = clients.get(self.id).await?;
        print_one(&client, self.output.format)
    }
}

#[derive(Debug, Args)]
pub struct AddClientCommand {
    /// The client's full name.
    pub name: String,
    /// The client's email address.
    pub email: String,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl_into_builder! {
    AddClientCommand => ClientInputBuilder {
        required: (name, email),
        copy: (),
    }
}

impl ExecutableCommand for AddClientCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let format = self.output.format;
        let input = ClientInputBuilder::from(self).build()?;
        validate_client(&input)?;
        let mut clients = ClientsResource::new(state.api());
        let created = clients.create(input).await?;
        print_one(&created, format)
    }
}

#[derive(Debug, Args)]
pub struct UpdateClientCommand {
    pub id: i64,
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub email: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl ExecutableCommand for UpdateClientCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let mut clients = ClientsResource::new(state.api());
        let existing = clients.get(self.id).await?;
        let mut form = ClientForm::editing(&existing);
        if let Some(name) = self.name {
            form.set_field(ClientField::Name, name);
        }
        if let Some(email) = self.email {
            form.set_field(ClientField::Email, email);
        }
        let mut input = None;
        if !form.submit(|values| input = Some(values)) {
            return form.errors().clone().into_result();
        }
        let Some(input) = input else {
            return Ok(());
        };
        let updated = clients.update(self.id, input).await?;
        print_one(&updated, self.output.format)
    }
}

#[derive(Debug, Args)]
pub struct RemoveClientCommand {
    /// The client(s) to delete.
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

impl ExecutableCommand for RemoveClientCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        println!("Removing {} client(s).", self.ids.len());
        let mut clients = ClientsResource::new(state.api());
        for id in self.ids {
            if !clients.delete(id).await? {
                println!("Client {id} was not deleted.");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ImportClientsCommand {
    #[arg(add = ArgValueCompleter::new(PathCompleter::file()))]
    /// The csv, yaml or jsonl file to import clients from.
    pub file: Utf8PathBuf,
}

impl ExecutableCommand for ImportClientsCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        println!("Reading file: {}", self.file);
        let inputs: Vec<ClientInput> = read_records(&self.file)?;
        println!("Importing {} client(s).", inputs.len());
        let mut clients = ClientsResource::new(state.api());
        let mut report = ImportReport::default();
        for input in inputs {
            if let Err(e) = validate_client(&input) {
                println!("Skipping {}: {e}", input.name);
                report.skipped += 1;
                continue;
            }
            match clients.create(input).await {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    warn!("Import failed: {e}");
                    report.skipped += 1;
                }
            }
        }
        println!(
            "Imported {} client(s), skipped {}.",
            report.imported, report.skipped
        );
        Ok(())
    }
}
