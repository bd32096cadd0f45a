use crate::{
    Result,
    model::{Client, DashboardData, Goal},
};
use clap::{Args, ValueEnum};
use cli_table::{Cell, CellStruct, Style, Table};
use serde::Serialize;
use serde_jsonlines::WriteExt;
use std::io::{self, Write};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Yaml,
    Json,
    /// One JSON object per line.
    Jsonl,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct OutputArgs {
    #[arg(short, long, value_enum, default_value_t)]
    /// How to print the results.
    pub format: OutputFormat,
}

/// A record that can be shown as a table row.
pub trait Tabular {
    fn title() -> Vec<CellStruct>;
    fn row(&self) -> Vec<CellStruct>;
}

impl Tabular for Client {
    fn title() -> Vec<CellStruct> {
        vec![
            "Id".cell().bold(true),
            "Name".cell().bold(true),
            "Email".cell().bold(true),
        ]
    }

    fn row(&self) -> Vec<CellStruct> {
        vec![self.id.cell(), self.name.as_str().cell(), self.email.as_str().cell()]
    }
}

impl Tabular for Goal {
    fn title() -> Vec<CellStruct> {
        vec![
            "Id".cell().bold(true),
            "Client".cell().bold(true),
            "Goal".cell().bold(true),
            "Target".cell().bold(true),
        ]
    }

    fn row(&self) -> Vec<CellStruct> {
        vec![
            self.id.cell(),
            self.client_id.cell(),
            self.goal_name.as_str().cell(),
            format!("{:.2}", self.target_amount).cell(),
        ]
    }
}

pub fn print_many<T: Serialize + Tabular>(items: &[T], format: OutputFormat) -> Result<()> {
    let mut stdout = io::stdout();
    match format {
        OutputFormat::Table => {
            let table = if items.is_empty() {
                vec![vec!["Nothing found".cell()]].table()
            } else {
                items
                    .iter()
                    .map(T::row)
                    .collect::<Vec<_>>()
                    .table()
                    .title(T::title())
            };
            cli_table::print_stdout(table)?;
        }
        OutputFormat::Yaml => serde_norway::to_writer(stdout, items)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, items)?;
            writeln!(stdout)?;
        }
        OutputFormat::Jsonl => stdout.write_json_lines(items)?,
    }
    Ok(())
}

pub fn print_one<T: Serialize + Tabular>(item: &T, format: OutputFormat) -> Result<()> {
    print_many(std::slice::from_ref(item), format)
}

/// Prints any serializable value; tables fall back to YAML.
pub fn print_value<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    let mut stdout = io::stdout();
    match format {
        OutputFormat::Table | OutputFormat::Yaml => serde_norway::to_writer(stdout, value)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
        OutputFormat::Jsonl => {
            serde_json::to_writer(&mut stdout, value)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct DashboardSummary<'a> {
    total_clients: usize,
    total_goals: usize,
    total_goal_amount: String,
    recent_clients: Vec<&'a Client>,
    recent_goals: Vec<RecentGoal<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct RecentGoal<'a> {
    goal_name: &'a str,
    client: &'a str,
    target_amount: String,
}

pub fn print_dashboard(dashboard: &DashboardData, format: OutputFormat) -> Result<()> {
    let recent_goals = dashboard
        .recent_goals()
        .into_iter()
        .map(|g| RecentGoal {
            goal_name: &g.goal_name,
            client: dashboard.client_name(g.client_id).unwrap_or("Unknown"),
            target_amount: format!("{:.2}", g.target_amount),
        })
        .collect::<Vec<_>>();
    if format != OutputFormat::Table {
        let summary = DashboardSummary {
            total_clients: dashboard.total_clients(),
            total_goals: dashboard.total_goals(),
            total_goal_amount: format!("{:.2}", dashboard.total_goal_amount()),
            recent_clients: dashboard.recent_clients(),
            recent_goals,
        };
        return print_value(&summary, format);
    }
    let totals = vec![
        vec!["Total clients".cell(), dashboard.total_clients().cell()],
        vec!["Total goals".cell(), dashboard.total_goals().cell()],
        vec![
            "Total goal amount".cell(),
            format!("{:.2}", dashboard.total_goal_amount()).cell(),
        ],
    ]
    .table();
    cli_table::print_stdout(totals)?;
    println!("\nRecent clients");
    let recent_clients = dashboard
        .recent_clients()
        .into_iter()
        .map(Client::row)
        .collect::<Vec<_>>()
        .table()
        .title(Client::title());
    cli_table::print_stdout(recent_clients)?;
    println!("\nRecent goals");
    let recent_goals = recent_goals
        .iter()
        .map(|g| vec![g.goal_name.cell(), g.client.cell(), g.target_amount.as_str().cell()])
        .collect::<Vec<_>>()
        .table()
        .title(vec![
            "Goal".cell().bold(true),
            "Client".cell().bold(true),
            "Target".cell().bold(true),
        ]);
    cli_table::print_stdout(recent_goals)?;
    Ok(())
}
