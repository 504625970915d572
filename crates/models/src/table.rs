use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

/// Canonical columns every parser emits first, in published order.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "Date",
    "Time",
    "Amount",
    "Bank",
    "Account",
    "Description",
    "Account Name",
    "Account Number",
];

/// Composite account key used for grouping and per-account sheets.
///
/// The account number is omitted when the source format has none.
pub fn account_key(name: &str, number: &str) -> String {
    if number == "N/A" {
        name.to_string()
    } else {
        format!("{}_{}", name, number)
    }
}

/// Wrap an amount as a JSON number cell. Negative zero is normalized so
/// "unparsable becomes 0" never publishes as `-0`.
pub fn number(value: f64) -> Value {
    let value = if value == 0.0 { 0.0 } else { value };
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Text rendering used for publication and group keys; nulls render empty.
/// Whole-number floats drop the trailing `.0` so account numbers survive
/// the spreadsheet round trip.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// An ordered, header-first table of JSON cell values.
///
/// Column names are not required to be unique until `dedup_columns` runs;
/// statement templates can legitimately collide with the canonical names
/// (TTB exports carry their own `Date`/`Time`/`Amount` headers).
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padded or truncated to the current column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Index of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a column holding the same value in every row.
    pub fn push_constant_column(&mut self, name: &str, value: Value) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.clone());
        }
    }

    /// Concatenate tables top to bottom, preserving row order per input.
    ///
    /// Columns merge as a multiset union in first-seen order: a name
    /// occurring k times in one input keeps k occurrences in the result,
    /// so the later de-duplication pass stays observable. Cells absent
    /// from a source table are null.
    pub fn concat(tables: &[Table]) -> Table {
        let mut out_columns: Vec<String> = Vec::new();
        let mut slots: HashMap<String, Vec<usize>> = HashMap::new();

        for table in tables {
            let mut occurrence: HashMap<&str, usize> = HashMap::new();
            for name in &table.columns {
                let seen = occurrence.entry(name.as_str()).or_insert(0);
                let nth = *seen;
                *seen += 1;

                let positions = slots.entry(name.clone()).or_default();
                if nth >= positions.len() {
                    positions.push(out_columns.len());
                    out_columns.push(name.clone());
                }
            }
        }

        let width = out_columns.len();
        let mut out = Table::new(out_columns);
        for table in tables {
            let mut occurrence: HashMap<&str, usize> = HashMap::new();
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .map(|name| {
                    let seen = occurrence.entry(name.as_str()).or_insert(0);
                    let nth = *seen;
                    *seen += 1;
                    slots[name.as_str()][nth]
                })
                .collect();

            for row in &table.rows {
                let mut new_row = vec![Value::Null; width];
                for (i, cell) in row.iter().enumerate() {
                    if let Some(&target) = mapping.get(i) {
                        new_row[target] = cell.clone();
                    }
                }
                out.rows.push(new_row);
            }
        }
        out
    }

    /// Drop all but the first occurrence of each duplicate column name,
    /// keeping the first occurrence's values.
    pub fn dedup_columns(&mut self) {
        let mut seen: HashSet<&str> = HashSet::new();
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| seen.insert(c.as_str()))
            .collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        self.columns = self
            .columns
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c.clone())
            .collect();
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let kept = keep[i];
                i += 1;
                kept
            });
        }
    }

    /// Stable ascending sort by the named columns (first occurrence of
    /// each). Null cells order after everything else. Missing key columns
    /// are ignored.
    pub fn sort_rows_by(&mut self, keys: &[&str]) {
        let indices: Vec<usize> = keys.iter().filter_map(|k| self.column_index(k)).collect();
        if indices.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            for &idx in &indices {
                let ord = compare_cells(&a[idx], &b[idx]);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Group rows by the named column. Group keys come back sorted
    /// ascending; row order within each group is preserved.
    pub fn group_by(&self, key: &str) -> Vec<(String, Table)> {
        let idx = self.column_index(key);
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            let k = idx.map(|c| cell_to_string(&row[c])).unwrap_or_default();
            groups.entry(k).or_default().push(i);
        }
        groups
            .into_iter()
            .map(|(k, members)| {
                let mut table = Table::new(self.columns.clone());
                for i in members {
                    table.rows.push(self.rows[i].clone());
                }
                (k, table)
            })
            .collect()
    }

    /// Header plus all rows as text cells, ready for publication.
    pub fn to_text_rows(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.columns.clone());
        for row in &self.rows {
            out.push(row.iter().map(cell_to_string).collect());
        }
        out
    }
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            } else {
                cell_to_string(a).cmp(&cell_to_string(b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn test_account_key_composition() {
        assert_eq!(account_key("Acme", "12345"), "Acme_12345");
        assert_eq!(account_key("KBank_THB", "N/A"), "KBank_THB");
    }

    #[test]
    fn test_concat_unions_columns_in_first_seen_order() {
        let a = table(&["Date", "Amount"], vec![vec![json!("2024-01-01"), json!(10.0)]]);
        let b = table(
            &["Date", "Memo"],
            vec![vec![json!("2024-01-02"), json!("rent")]],
        );
        let out = Table::concat(&[a, b]);

        assert_eq!(out.columns(), &["Date", "Amount", "Memo"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[0][2], Value::Null);
        assert_eq!(out.rows()[1][1], Value::Null);
        assert_eq!(out.rows()[1][2], json!("rent"));
    }

    #[test]
    fn test_concat_keeps_duplicate_columns() {
        let a = table(
            &["Date", "Date"],
            vec![vec![json!("canonical"), json!("raw")]],
        );
        let out = Table::concat(&[a.clone(), a]);
        assert_eq!(out.columns(), &["Date", "Date"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[1][1], json!("raw"));
    }

    #[test]
    fn test_dedup_columns_keeps_first_occurrence_values() {
        let mut t = table(
            &["Date", "Amount", "Date"],
            vec![vec![json!("2024-01-01"), json!(5.0), json!("01/01/2024")]],
        );
        t.dedup_columns();
        assert_eq!(t.columns(), &["Date", "Amount"]);
        assert_eq!(t.rows()[0], vec![json!("2024-01-01"), json!(5.0)]);
    }

    #[test]
    fn test_sort_is_ascending_and_stable_with_nulls_last() {
        let mut t = table(
            &["Company", "Account", "Date", "Time", "Tag"],
            vec![
                vec![json!("A"), json!("X"), json!("2024-03-02"), Value::Null, json!("r1")],
                vec![json!("A"), json!("X"), json!("2024-03-01"), Value::Null, json!("r2")],
                vec![json!("A"), json!("X"), Value::Null, Value::Null, json!("r3")],
                vec![json!("A"), json!("X"), json!("2024-03-01"), Value::Null, json!("r4")],
            ],
        );
        t.sort_rows_by(&["Company", "Account", "Date", "Time"]);
        let tags: Vec<String> = t.rows().iter().map(|r| cell_to_string(&r[4])).collect();
        assert_eq!(tags, vec!["r2", "r4", "r1", "r3"]);
    }

    #[test]
    fn test_group_by_sorts_keys_and_preserves_row_order() {
        let t = table(
            &["Account", "Seq"],
            vec![
                vec![json!("B"), json!(1)],
                vec![json!("A"), json!(2)],
                vec![json!("B"), json!(3)],
            ],
        );
        let groups = t.group_by("Account");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[1].0, "B");
        let seqs: Vec<String> = groups[1]
            .1
            .rows()
            .iter()
            .map(|r| cell_to_string(&r[1]))
            .collect();
        assert_eq!(seqs, vec!["1", "3"]);
    }

    #[test]
    fn test_text_rows_render_nulls_empty_and_trim_integral_floats() {
        let t = table(
            &["Account Number", "Amount", "Time"],
            vec![vec![json!(1234567890.0), json!(-40.5), Value::Null]],
        );
        let rows = t.to_text_rows();
        assert_eq!(rows[0], vec!["Account Number", "Amount", "Time"]);
        assert_eq!(rows[1], vec!["1234567890", "-40.5", ""]);
    }

    #[test]
    fn test_number_normalizes_negative_zero() {
        assert_eq!(cell_to_string(&number(-0.0)), "0");
        assert_eq!(cell_to_string(&number(-12.5)), "-12.5");
    }

    #[test]
    fn test_push_constant_column() {
        let mut t = table(&["Date"], vec![vec![json!("2024-01-01")], vec![json!("2024-01-02")]]);
        t.push_constant_column("Company", json!("Acme"));
        assert_eq!(t.columns(), &["Date", "Company"]);
        assert!(t.rows().iter().all(|r| r[1] == json!("Acme")));
    }
}
