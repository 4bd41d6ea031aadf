use std::path::Path;

use calamine::DataType;
use survey_ledger::Cell;

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// The directory that holds the given file. A bare file name lives in the current directory.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

pub fn cell_from_calamine(dt: &DataType) -> Cell {
    match dt {
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Bool(*b),
        DataType::DateTime(f) => Cell::DateTime(*f),
        DataType::Empty => Cell::Empty,
        // Formula errors (#N/A, ...) carry no value.
        _ => Cell::Empty,
    }
}

pub fn header_name(dt: &DataType) -> String {
    cell_from_calamine(dt).as_text().unwrap_or_default()
}
