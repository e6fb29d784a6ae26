//! CSV source reading.
//!
//! Definition files are UTF-8 CSV with an optional BOM. The first row is
//! the header naming the declared keys; blank rows are skipped. Cells may
//! be double-quoted, with `""` escaping an embedded quote.

use crate::error::DefError;

/// A parsed CSV file: header keys plus data rows, all cells trimmed of the
/// record separator but otherwise verbatim.
#[derive(Debug, Clone)]
pub struct CsvTable {
    keys: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse CSV text. Fails with `EmptyInput` when there is no header row.
    pub fn parse(text: &str) -> Result<Self, DefError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut records: Vec<Vec<String>> = Vec::new();
        for line in text.lines() {
            let cells = split_record(line);
            if cells.iter().any(|cell| !cell.trim().is_empty()) || records.is_empty() {
                records.push(cells);
            }
        }

        if records.is_empty() {
            return Err(DefError::EmptyInput);
        }

        let keys = records.remove(0);
        let rows = records
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Ok(CsvTable { keys, rows })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Project every row onto `declared` key order. Fails with `Schema`
    /// when a declared key is missing from the header. Cells beyond a
    /// short row's end project as empty.
    pub fn project(&self, declared: &[&str]) -> Result<Vec<Vec<String>>, DefError> {
        let mut indices = Vec::with_capacity(declared.len());
        for key in declared {
            let index = self
                .keys
                .iter()
                .position(|k| k == key)
                .ok_or_else(|| DefError::Schema {
                    key: (*key).to_string(),
                })?;
            indices.push(index);
        }

        Ok(self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&index| row.get(index).cloned().unwrap_or_default())
                    .collect()
            })
            .collect())
    }
}

/// Split one CSV record into cells, honoring double quotes.
fn split_record(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if cell.is_empty() => quoted = true,
            ',' if !quoted => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(ch),
        }
    }
    cells.push(cell);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let table = CsvTable::parse("name,value,define\nA,0x100,=\nB,0x200,=\n").unwrap();
        assert_eq!(table.keys(), &["name", "value", "define"]);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn strips_bom() {
        let table = CsvTable::parse("\u{feff}name,value\nA,1\n").unwrap();
        assert_eq!(table.keys()[0], "name");
    }

    #[test]
    fn skips_blank_rows() {
        let table = CsvTable::parse("name,value\n,\nA,1\n\n").unwrap();
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(CsvTable::parse(""), Err(DefError::EmptyInput)));
    }

    #[test]
    fn quoted_cells() {
        let table = CsvTable::parse("name,notes\nA,\"x, y\"\n").unwrap();
        assert_eq!(table.rows()[0][1], "x, y");
    }

    #[test]
    fn project_reorders_columns() {
        let table = CsvTable::parse("define,name,value\n=,A,0x1\n").unwrap();
        let rows = table.project(&["name", "value", "define"]).unwrap();
        assert_eq!(rows[0], vec!["A", "0x1", "="]);
    }

    #[test]
    fn project_missing_key_is_schema_error() {
        let table = CsvTable::parse("name,value\nA,1\n").unwrap();
        let err = table.project(&["name", "define"]).unwrap_err();
        assert!(matches!(err, DefError::Schema { key } if key == "define"));
    }

    #[test]
    fn short_rows_project_empty_cells() {
        let table = CsvTable::parse("name,value,define\nA\n").unwrap();
        let rows = table.project(&["name", "value", "define"]).unwrap();
        assert_eq!(rows[0], vec!["A", "", ""]);
    }
}
