//! Local spreadsheet: append rows to a CSV file

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use super::{PersistError, PersistedRow, RecordStore};

pub struct CsvSheet {
    path: PathBuf,
}

impl CsvSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl RecordStore for CsvSheet {
    fn append(&mut self, row: &PersistedRow) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = row
            .cells()
            .iter()
            .map(|c| escape(c))
            .collect::<Vec<_>>()
            .join(",");
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        log::info!("Appended result row to {}", self.path.display());
        Ok(())
    }
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str], status: &str) -> PersistedRow {
        PersistedRow {
            values: values.iter().map(|v| v.to_string()).collect(),
            status: status.to_string(),
            timestamp: "2024-03-02 08:30:05".to_string(),
        }
    }

    #[test]
    fn test_rows_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("results.csv");
        let mut sheet = CsvSheet::new(&path);
        sheet.append(&row(&["1234567", "1234567"], "Match")).unwrap();
        sheet.append(&row(&["12", "N/A"], "No Match")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "1234567,1234567,Match,2024-03-02 08:30:05\n12,N/A,No Match,2024-03-02 08:30:05\n"
        );
    }

    #[test]
    fn test_cells_with_separators_are_quoted() {
        assert_eq!(escape("AB,12"), "\"AB,12\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("plain"), "plain");
    }
}
