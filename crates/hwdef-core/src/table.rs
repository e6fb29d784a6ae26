//! Deterministic table emitter.
//!
//! Renders ordered rows of text cells into column-aligned blocks. The same
//! row matrix always renders to byte-identical text; regression tests rely
//! on that.

/// An ordered row matrix. Rows may have differing lengths; short rows are
/// treated as padded with empty cells up to the widest row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Table { rows }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Remove annotation column pairs whose label cell is empty in every
    /// row but the first (the synthetic header row). Each pair is
    /// `(separator column, label column)`; both are removed from every row,
    /// header included. Surviving columns are rebuilt from a kept-column
    /// index set, so multiple pairs collapse without index shifting.
    pub fn collapse_empty_pairs(&mut self, pairs: &[(usize, usize)]) {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut kept: Vec<bool> = vec![true; width];

        for &(sep, label) in pairs {
            let all_empty = self
                .rows
                .iter()
                .skip(1)
                .all(|row| row.get(label).map_or(true, |cell| cell.is_empty()));
            if all_empty {
                if sep < width {
                    kept[sep] = false;
                }
                if label < width {
                    kept[label] = false;
                }
            }
        }

        if kept.iter().all(|&k| k) {
            return;
        }

        self.rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(index, _)| kept[*index])
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();
    }

    /// Render with per-column widths, cells joined by `separator`.
    /// Every cell is left-justified except the last column, which is left
    /// unpadded; each line is right-trimmed.
    pub fn render(&self, separator: &str) -> String {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return String::new();
        }

        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row.get(col).map_or(0, |cell| cell.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(columns);
                for col in 0..columns {
                    let cell = row.get(col).map(String::as_str).unwrap_or("");
                    if col < columns - 1 {
                        let pad = widths[col].saturating_sub(cell.chars().count());
                        cells.push(format!("{cell}{}", " ".repeat(pad)));
                    } else {
                        cells.push(cell.to_string());
                    }
                }
                cells.join(separator).trim_end().to_string()
            })
            .collect();

        lines.join("\n")
    }
}

/// A block of text decorated with banner rules, title lines, and prefixes.
///
/// Builder-style: each method consumes and returns the block.
#[derive(Debug, Clone)]
pub struct TextBlock {
    contents: String,
}

impl TextBlock {
    pub fn new(contents: impl Into<String>) -> Self {
        TextBlock {
            contents: contents.into(),
        }
    }

    fn rule(&self, ch: char) -> String {
        let width = self
            .contents
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        ch.to_string().repeat(width)
    }

    /// Insert a repeated-character rule above the block, sized to the
    /// block's widest line.
    pub fn rule_above(self, ch: char) -> Self {
        let rule = self.rule(ch);
        TextBlock {
            contents: format!("{rule}\n{}", self.contents),
        }
    }

    /// Wrap the block in a rule above and below.
    pub fn framed(self, ch: char) -> Self {
        let rule = self.rule(ch);
        TextBlock {
            contents: format!("{rule}\n{}\n{rule}", self.contents),
        }
    }

    pub fn line_above(self, line: &str) -> Self {
        TextBlock {
            contents: format!("{line}\n{}", self.contents),
        }
    }

    pub fn line_below(self, line: &str) -> Self {
        TextBlock {
            contents: format!("{}\n{line}", self.contents),
        }
    }

    /// Prefix every line. Applied after framing, the prefix is excluded
    /// from the rule-width computation.
    pub fn prefixed(self, prefix: &str) -> Self {
        let contents = self
            .contents
            .lines()
            .map(|line| format!("{prefix}{line}").trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        TextBlock { contents }
    }

    pub fn as_str(&self) -> &str {
        &self.contents
    }

    pub fn into_string(self) -> String {
        self.contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn aligns_columns() {
        let table = Table::from_rows(rows(&[
            &["#define", "A", "0x1"],
            &["#define", "LONG_NAME", "0x2"],
        ]));
        assert_eq!(
            table.render(" "),
            "#define A         0x1\n#define LONG_NAME 0x2"
        );
    }

    #[test]
    fn pads_short_rows_and_trims_last_column() {
        let table = Table::from_rows(rows(&[&["a", "b", "c"], &["a"]]));
        let text = table.render(" ");
        for line in text.lines() {
            assert_eq!(line, line.trim_end());
        }
        assert_eq!(text.lines().nth(1).unwrap(), "a");
    }

    #[test]
    fn rendering_is_idempotent() {
        let table = Table::from_rows(rows(&[&["x", "yy", "zzz"], &["aaaa", "b", ""]]));
        assert_eq!(table.render(" "), table.render(" "));
    }

    #[test]
    fn no_line_exceeds_banner_width() {
        let table = Table::from_rows(rows(&[&["#define", "NAME", "0x10"], &["#define", "N", "0x1"]]));
        let block = TextBlock::new(table.render(" ")).framed('=');
        let text = block.into_string();
        let banner = text.lines().next().unwrap().len();
        for line in text.lines() {
            assert!(line.len() <= banner);
        }
    }

    #[test]
    fn collapses_fully_empty_pairs() {
        let mut table = Table::from_rows(rows(&[
            &["", "//", "Keyword", "|", "Array", "|", "Field"],
            &["a", "//", "K1", "|", "", "|", "f1"],
            &["b", "//", "K2", "|", "", "|", ""],
        ]));
        table.collapse_empty_pairs(&[(3, 4), (5, 6)]);
        assert_eq!(
            table.rows(),
            &rows(&[
                &["", "//", "Keyword", "|", "Field"],
                &["a", "//", "K1", "|", "f1"],
                &["b", "//", "K2", "|", ""],
            ])[..]
        );
    }

    #[test]
    fn collapse_removes_both_pairs_and_header_cells() {
        let mut table = Table::from_rows(rows(&[
            &["h", "|", "Array", "|", "Field"],
            &["r", "|", "", "|", ""],
        ]));
        table.collapse_empty_pairs(&[(1, 2), (3, 4)]);
        assert_eq!(table.rows(), &rows(&[&["h"], &["r"]])[..]);
    }

    #[test]
    fn keeps_pairs_with_any_content() {
        let mut table = Table::from_rows(rows(&[
            &["h", "|", "Array"],
            &["r1", "|", ""],
            &["r2", "|", "arr"],
        ]));
        table.collapse_empty_pairs(&[(1, 2)]);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[0].len(), 3);
    }

    #[test]
    fn framed_block_rules() {
        let block = TextBlock::new("Section").framed('=').prefixed("// ");
        assert_eq!(block.as_str(), "// =======\n// Section\n// =======");
    }

    #[test]
    fn rule_above_and_title() {
        let block = TextBlock::new("a: 1\nbb: 22")
            .rule_above('-')
            .line_above("Title")
            .framed('=');
        let text = block.into_string();
        assert!(text.starts_with("======\nTitle\n------\n"));
    }
}
