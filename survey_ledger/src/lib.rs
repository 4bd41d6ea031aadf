mod schema;
use log::{debug, info, warn};

use std::collections::BTreeSet;

pub mod builder;
pub mod manual;

pub use crate::schema::*;

// **** Dataset ****

/// The full content of the survey sheet: a header and the rows in insertion order.
///
/// Invariant: every row has exactly one cell per column.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// An empty dataset with the survey columns.
    pub fn with_schema() -> Dataset {
        Dataset {
            columns: SCHEMA_COLUMNS.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a dataset, padding or truncating the rows to the width of the header.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Dataset {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Dataset { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Reorders the columns to the given list.
    ///
    /// Requested columns that are absent are filled with empty cells; the other
    /// columns are dropped.
    pub fn reindex(&self, columns: &[&str]) -> Dataset {
        let dropped: Vec<&String> = self
            .columns
            .iter()
            .filter(|c| !columns.contains(&c.as_str()))
            .collect();
        if !dropped.is_empty() {
            warn!("reindex: dropping columns not in the schema: {:?}", dropped);
        }
        let positions: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|p| p.and_then(|idx| row.get(idx).cloned()).unwrap_or(Cell::Empty))
                    .collect()
            })
            .collect();
        Dataset {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }
}

/// Appends a record to the dataset loaded from disk (if any).
///
/// The result always follows the survey column order, whatever the order of the
/// columns in the existing dataset.
pub fn merge_record(existing: Option<Dataset>, record: &Record) -> Dataset {
    let mut merged = match existing {
        Some(ds) => {
            debug!("merge_record: merging into {} existing rows", ds.len());
            ds.reindex(&SCHEMA_COLUMNS)
        }
        None => Dataset::with_schema(),
    };
    merged.rows.push(record.to_row());
    info!("merge_record: dataset now has {} rows", merged.len());
    merged
}

// **** Normalization ****

// Variants of the alef that are typed interchangeably.
const ALEF_VARIANTS: [char; 3] = ['أ', 'إ', 'آ'];
const ALEF: char = 'ا';

/// Trims the text and folds the alef variants to the bare alef.
pub fn normalize_text(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| if ALEF_VARIANTS.contains(&c) { ALEF } else { c })
        .collect()
}

/// Normalizes any cell. Missing values stay missing; other values are compared as text.
pub fn normalize_cell(cell: &Cell) -> Cell {
    match cell.as_text() {
        Some(s) => Cell::Text(normalize_text(&s)),
        None => Cell::Empty,
    }
}

/// Normalizes in place all the free text columns present in the dataset.
pub fn normalize_columns(dataset: &mut Dataset) {
    let indexes: Vec<usize> = NORMALIZED_COLUMNS
        .iter()
        .filter_map(|c| dataset.column_index(c))
        .collect();
    debug!("normalize_columns: columns {:?}", indexes);
    for row in dataset.rows.iter_mut() {
        for idx in indexes.iter() {
            row[*idx] = normalize_cell(&row[*idx]);
        }
    }
}

// **** Duplicates ****

// Cell values with a total order, so that keys can be stored in an ordered set.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
enum KeyPart {
    Empty,
    Bool(bool),
    Number(u64),
    DateTime(u64),
    Text(String),
}

impl KeyPart {
    fn from_cell(cell: &Cell) -> KeyPart {
        match cell {
            Cell::Empty => KeyPart::Empty,
            Cell::Bool(b) => KeyPart::Bool(*b),
            // 0.0 and -0.0 are the same value.
            Cell::Number(n) if *n == 0.0 => KeyPart::Number(0f64.to_bits()),
            Cell::Number(n) => KeyPart::Number(n.to_bits()),
            Cell::Text(s) => KeyPart::Text(s.clone()),
            Cell::DateTime(n) => KeyPart::DateTime(n.to_bits()),
        }
    }
}

/// The values of a row over the key columns.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct DuplicateKey(Vec<KeyPart>);

impl DuplicateKey {
    pub fn of_row(row: &[Cell], key_columns: &[usize]) -> DuplicateKey {
        DuplicateKey(
            key_columns
                .iter()
                .map(|idx| KeyPart::from_cell(row.get(*idx).unwrap_or(&Cell::Empty)))
                .collect(),
        )
    }
}

/// The positions of the duplicate key columns that exist in this dataset, in key order.
pub fn resolve_key_columns(dataset: &Dataset) -> Vec<usize> {
    DUPLICATE_KEY_COLUMNS
        .iter()
        .filter_map(|c| dataset.column_index(c))
        .collect()
}

/// True if this key was already seen in an earlier row.
pub fn is_duplicate(key: &DuplicateKey, seen: &BTreeSet<DuplicateKey>) -> bool {
    seen.contains(key)
}

/// Flags every row whose key already appeared in an earlier row.
/// The first occurrence of a key is never flagged.
pub fn flag_duplicates(dataset: &Dataset, key_columns: &[usize]) -> Vec<bool> {
    let mut seen: BTreeSet<DuplicateKey> = BTreeSet::new();
    let mut flags: Vec<bool> = Vec::with_capacity(dataset.len());
    for row in dataset.rows.iter() {
        let key = DuplicateKey::of_row(row, key_columns);
        let dup = is_duplicate(&key, &seen);
        if !dup {
            seen.insert(key);
        }
        flags.push(dup);
    }
    flags
}

/// The result of auditing a dataset for duplicates.
#[derive(PartialEq, Debug, Clone)]
pub enum AuditOutcome {
    /// None of the key columns exist: nothing can be said about duplicates.
    NoKeyColumns,
    NoDuplicates,
    /// The normalized dataset, with one flag per row.
    Duplicates { dataset: Dataset, flags: Vec<bool> },
}

impl AuditOutcome {
    pub fn duplicate_count(&self) -> usize {
        match self {
            AuditOutcome::Duplicates { flags, .. } => flags.iter().filter(|f| **f).count(),
            _ => 0,
        }
    }

    /// The spreadsheet row numbers (1-based, the header being row 1) of the duplicates.
    pub fn duplicate_row_numbers(&self) -> Vec<usize> {
        match self {
            AuditOutcome::Duplicates { flags, .. } => flags
                .iter()
                .enumerate()
                .filter(|(_, f)| **f)
                .map(|(idx, _)| idx + 2)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Normalizes the free text columns and flags the duplicate rows.
pub fn audit_dataset(mut dataset: Dataset) -> AuditOutcome {
    info!(
        "audit_dataset: {} rows, columns: {:?}",
        dataset.len(),
        dataset.columns
    );
    let key_columns = resolve_key_columns(&dataset);
    if key_columns.is_empty() {
        return AuditOutcome::NoKeyColumns;
    }
    debug!("audit_dataset: key columns {:?}", key_columns);

    normalize_columns(&mut dataset);

    let flags = flag_duplicates(&dataset, &key_columns);
    if !flags.iter().any(|f| *f) {
        return AuditOutcome::NoDuplicates;
    }
    AuditOutcome::Duplicates { dataset, flags }
}
