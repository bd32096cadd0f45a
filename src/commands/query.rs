use super::{ExecutableCommand, OutputArgs, completion, output::print_value};
use crate::{Error, Result, State, router::Service};
use camino::Utf8PathBuf;
use clap::Args;
use clap_complete::{ArgValueCompleter, PathCompleter};
use log::info;
use serde_json::{Map, Value};
use std::fs;

#[derive(Debug, Args)]
pub struct QueryCommand {
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    /// The GraphQL document to send.
    pub document: Option<String>,
    #[arg(long, add = ArgValueCompleter::new(PathCompleter::file()))]
    /// Read the document from this file instead.
    pub file: Option<Utf8PathBuf>,
    #[arg(short, long, add = ArgValueCompleter::new(completion::operation_names))]
    /// Operation name used for routing; defaults to the one declared in the document.
    pub name: Option<String>,
    #[arg(long, value_enum)]
    /// Send to this service instead of routing by name.
    pub service: Option<Service>,
    #[arg(long)]
    /// Variables as a JSON object.
    pub variables: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl QueryCommand {
    fn document(&self) -> Result<String> {
        match (&self.document, &self.file) {
            (Some(document), _) => Ok(document.clone()),
            (None, Some(file)) => Ok(fs::read_to_string(file)?),
            (None, None) => Err(Error::simple("No document given")),
        }
    }

    fn variables(&self) -> Result<Map<String, Value>> {
        match self.variables.as_deref() {
            None => Ok(Map::new()),
            Some(text) if text.trim().is_empty() => Ok(Map::new()),
            Some(text) => Ok(serde_json::from_str(text)?),
        }
    }
}

impl ExecutableCommand for QueryCommand {
    async fn execute(self, state: &mut State) -> Result<()> {
        let document = self.document()?;
        let variables = self.variables()?;
        info!("Sending {}", self.name.as_deref().unwrap_or("raw document"));
        let data = state
            .api()
            .execute_raw(self.name.as_deref(), &document, variables, self.service)
            .await?;
        print_value(&data, self.output.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::OutputFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn command(variables: Option<&str>) -> QueryCommand {
        QueryCommand {
            document: Some(String::from("query GetProgress { progress }")),
            file: None,
            name: None,
            service: None,
            variables: variables.map(String::from),
            output: OutputArgs {
                format: OutputFormat::Json,
            },
        }
    }

    #[test]
    fn variables_parse_as_an_object() {
        let vars = command(Some(r#"{"id": "4"}"#)).variables().unwrap();
        assert_eq!(Value::Object(vars), json!({"id": "4"}));
        assert!(command(None).variables().unwrap().is_empty());
        assert!(command(Some("  ")).variables().unwrap().is_empty());
    }

    #[test]
    fn variables_must_be_an_object() {
        assert!(command(Some("[1, 2]")).variables().is_err());
    }

    #[test]
    fn document_comes_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("q.graphql")).unwrap();
        fs::write(&path, "query GetAllGoals { goals { id } }").unwrap();
        let mut cmd = command(None);
        cmd.document = None;
        cmd.file = Some(path);
        assert_eq!(cmd.document().unwrap(), "query GetAllGoals { goals { id } }");
    }
}
