use crate::{Error, Result};
use camino::Utf8Path;
use serde::de::DeserializeOwned;
use std::fs;

/// Reads records from a csv, yaml or json-lines file, picked by extension.
pub(crate) fn read_records<T: DeserializeOwned>(path: &Utf8Path) -> Result<Vec<T>> {
    match path.extension() {
        Some("yml") | Some("yaml") => {
            let data = fs::read(path)?;
            Ok(serde_norway::from_slice(&data)?)
        }
        Some("csv") => Ok(csv::Reader::from_path(path)?
            .into_deserialize()
            .collect::<csv::Result<Vec<_>>>()?),
        Some("tsv") => Ok(csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?
            .into_deserialize()
            .collect::<csv::Result<Vec<_>>>()?),
        Some("jsonl") | Some("jsonlines") | Some("ndjson") => {
            Ok(serde_jsonlines::json_lines(path)?.collect::<std::io::Result<Vec<_>>>()?)
        }
        Some(ext) => Err(Error::unsupported_file_type(ext)),
        None => Err(Error::unsupported_file_type("No extension")),
    }
}

/// What an import did, for the summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientInput, GoalInput};
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn clients_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "clients.csv",
            "name,email\nAda,ada@example.com\nGrace,grace@example.com\n",
        );
        let clients: Vec<ClientInput> = read_records(&path).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[1].email, "grace@example.com");
    }

    #[test]
    fn goals_from_yaml_and_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(
            &dir,
            "goals.yaml",
            "- clientId: 1\n  goalName: House\n  goalAmount: 250000\n",
        );
        let jsonl = write(
            &dir,
            "goals.jsonl",
            "{\"clientId\":\"2\",\"goalName\":\"Car\",\"goalAmount\":15000.5}\n",
        );
        let from_yaml: Vec<GoalInput> = read_records(&yaml).unwrap();
        let from_jsonl: Vec<GoalInput> = read_records(&jsonl).unwrap();
        assert_eq!(from_yaml[0].goal_amount, dec!(250000));
        assert_eq!(from_jsonl[0].client_id, 2);
        assert_eq!(from_jsonl[0].goal_amount, dec!(15000.5));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "clients.xml", "<clients/>");
        let error = read_records::<ClientInput>(&path).unwrap_err();
        assert_eq!(error.to_string(), "Unsupported file type: xml");
    }
}
