// Reading and writing the dataset workbook.

use std::fs;
use std::io::Write;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use log::{debug, info};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use snafu::prelude::*;
use survey_ledger::{Cell, Dataset};
use tempfile::NamedTempFile;

use crate::survey::io_common::{cell_from_calamine, display_path, header_name, parent_dir};
use crate::survey::{
    EmptyExcelSnafu, OpeningExcelSnafu, PersistingDatasetSnafu, SurveyResult, WritingExcelSnafu,
};

/// Rows to paint when writing the dataset.
pub struct Highlight<'a> {
    /// One flag per data row.
    pub rows: &'a [bool],
    /// 0xRRGGBB
    pub fill_color: u32,
}

/// Reads the first worksheet. The first row is the header.
pub fn read_dataset(path: &Path) -> SurveyResult<Dataset> {
    let path_s = display_path(path);
    debug!("read_dataset: path: {:?}", &path_s);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu {
            path: path_s.clone(),
        })?
        .context(OpeningExcelSnafu {
            path: path_s.clone(),
        })?;

    let mut iter = wrange.rows();
    let columns: Vec<String> = match iter.next() {
        Some(header) => header.iter().map(header_name).collect(),
        // A sheet without any cell.
        None => return Ok(Dataset::default()),
    };
    debug!("read_dataset: header: {:?}", columns);

    let rows: Vec<Vec<Cell>> = iter
        .map(|row| row.iter().map(cell_from_calamine).collect())
        .collect();
    info!("read_dataset: {} rows read from {}", rows.len(), path_s);
    Ok(Dataset::from_rows(columns, rows))
}

/// Writes the dataset to a single right-to-left worksheet, replacing the file atomically.
pub fn write_dataset(
    path: &Path,
    dataset: &Dataset,
    sheet_name: &str,
    highlight: Option<&Highlight>,
) -> SurveyResult<()> {
    let path_s = display_path(path);
    let buffer = build_workbook(dataset, sheet_name, highlight).context(WritingExcelSnafu {
        path: path_s.clone(),
    })?;
    persist_atomically(path, &buffer)?;
    info!(
        "write_dataset: {} rows written to {}",
        dataset.len(),
        path_s
    );
    Ok(())
}

// Excel keeps dates as serial numbers; only the number format tells them apart.
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATE_TIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

// The formats of the data cells of one row.
struct CellFormats {
    fill: Option<Format>,
    date: Format,
    date_time: Format,
}

impl CellFormats {
    fn new(fill_color: Option<u32>) -> CellFormats {
        let filled = |f: Format| match fill_color {
            Some(c) => f.set_background_color(Color::RGB(c)),
            None => f,
        };
        CellFormats {
            fill: fill_color.map(|_| filled(Format::new())),
            date: filled(Format::new().set_num_format(DATE_FORMAT)),
            date_time: filled(Format::new().set_num_format(DATE_TIME_FORMAT)),
        }
    }

    fn for_date(&self, serial: f64) -> &Format {
        if serial.fract() == 0.0 {
            &self.date
        } else {
            &self.date_time
        }
    }
}

fn build_workbook(
    dataset: &Dataset,
    sheet_name: &str,
    highlight: Option<&Highlight>,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let plain = CellFormats::new(None);
    let highlighted = highlight.map(|h| (h.rows, CellFormats::new(Some(h.fill_color))));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    worksheet.set_right_to_left(true);

    for (col, name) in dataset.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (idx, row) in dataset.rows.iter().enumerate() {
        // Row 0 is the header.
        let xl_row = (idx + 1) as u32;
        let formats = match &highlighted {
            Some((flags, f)) if flags.get(idx).cloned().unwrap_or(false) => f,
            _ => &plain,
        };
        if let Some(f) = &formats.fill {
            debug!("build_workbook: highlighting row {}", xl_row);
            worksheet.set_row_format(xl_row, f)?;
        }
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, xl_row, col as u16, cell, formats)?;
        }
    }

    workbook.save_to_buffer()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &CellFormats,
) -> Result<(), XlsxError> {
    match (cell, &formats.fill) {
        (Cell::Empty, None) => {}
        (Cell::Empty, Some(f)) => {
            worksheet.write_blank(row, col, f)?;
        }
        (Cell::Text(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
        (Cell::Text(s), Some(f)) => {
            worksheet.write_string_with_format(row, col, s, f)?;
        }
        (Cell::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (Cell::Number(n), Some(f)) => {
            worksheet.write_number_with_format(row, col, *n, f)?;
        }
        (Cell::Bool(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (Cell::Bool(b), Some(f)) => {
            worksheet.write_boolean_with_format(row, col, *b, f)?;
        }
        (Cell::DateTime(n), _) => {
            worksheet.write_number_with_format(row, col, *n, formats.for_date(*n))?;
        }
    }
    Ok(())
}

// The new content is written next to the target and renamed over it, so that readers
// never see a partially written file. The replaced file keeps its permissions.
fn persist_atomically(path: &Path, bytes: &[u8]) -> SurveyResult<()> {
    let path_s = display_path(path);
    let mut tmp = NamedTempFile::new_in(parent_dir(path)).context(PersistingDatasetSnafu {
        path: path_s.clone(),
    })?;
    tmp.write_all(bytes).context(PersistingDatasetSnafu {
        path: path_s.clone(),
    })?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .context(PersistingDatasetSnafu {
                path: path_s.clone(),
            })?;
    }
    tmp.as_file().sync_all().context(PersistingDatasetSnafu {
        path: path_s.clone(),
    })?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .context(PersistingDatasetSnafu { path: path_s })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use survey_ledger::SCHEMA_COLUMNS;
    use tempfile::tempdir;

    // The raw XML of one part of the saved package.
    fn xml_part(path: &Path, name: &str) -> String {
        let file = fs::File::open(path).expect("open");
        let mut archive = zip::ZipArchive::new(file).expect("zip archive");
        let mut part = archive.by_name(name).expect("part");
        let mut xml = String::new();
        part.read_to_string(&mut xml).expect("read part");
        xml
    }

    // Row numbers of the `<row>` elements that carry a row format.
    fn formatted_rows(sheet_xml: &str) -> Vec<u32> {
        sheet_xml
            .split("<row ")
            .skip(1)
            .filter_map(|chunk| {
                let tag = &chunk[..chunk.find('>')?];
                if !tag.contains("customFormat=\"1\"") {
                    return None;
                }
                let start = tag.find("r=\"")? + 3;
                let len = tag[start..].find('"')?;
                tag[start..start + len].parse().ok()
            })
            .collect()
    }

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["نص".to_string(), "عدد".to_string(), "فارغ".to_string()],
            vec![
                vec![Cell::text("أحمد"), Cell::Number(12.0), Cell::Empty],
                vec![Cell::text("لا يوجد"), Cell::Number(0.0), Cell::text("x")],
            ],
        )
    }

    #[test]
    fn round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        let ds = sample();
        write_dataset(&path, &ds, "الردود", None).expect("write");
        let read = read_dataset(&path).expect("read");
        assert_eq!(read, ds);
    }

    #[test]
    fn round_trip_with_highlight() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        let ds = sample();
        let flags = [false, true];
        let highlight = Highlight {
            rows: &flags,
            fill_color: 0xFFC7CE,
        };
        write_dataset(&path, &ds, "الردود", Some(&highlight)).expect("write");
        assert_eq!(read_dataset(&path).expect("read"), ds);
    }

    #[test]
    fn only_flagged_rows_are_filled() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        let row = |s: &str| vec![Cell::text(s), Cell::Number(1.0), Cell::Empty];
        let ds = Dataset::from_rows(
            vec!["نص".to_string(), "عدد".to_string(), "فارغ".to_string()],
            vec![row("a"), row("b"), row("c"), row("d")],
        );
        let flags = [false, true, true, false];
        let highlight = Highlight {
            rows: &flags,
            fill_color: 0xFFC7CE,
        };
        write_dataset(&path, &ds, "الردود", Some(&highlight)).expect("write");

        let sheet = xml_part(&path, "xl/worksheets/sheet1.xml");
        // Data row i is worksheet row i + 2, after the header.
        assert_eq!(formatted_rows(&sheet), vec![3, 4]);
        assert!(sheet.contains("rightToLeft=\"1\""));
        let styles = xml_part(&path, "xl/styles.xml");
        assert!(styles.contains("FFC7CE"));
    }

    #[test]
    fn no_highlight_means_no_fill() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        write_dataset(&path, &sample(), "الردود", None).expect("write");
        let sheet = xml_part(&path, "xl/worksheets/sheet1.xml");
        assert!(formatted_rows(&sheet).is_empty());
        assert!(sheet.contains("rightToLeft=\"1\""));
        assert!(!xml_part(&path, "xl/styles.xml").contains("FFC7CE"));
    }

    #[test]
    fn dates_stay_dates() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        let ds = Dataset::from_rows(
            vec!["بداية".to_string(), "إرسال".to_string()],
            vec![
                vec![Cell::DateTime(45292.0), Cell::DateTime(45292.5)],
                vec![Cell::DateTime(45293.0), Cell::text("x")],
            ],
        );
        let flags = [true, false];
        let highlight = Highlight {
            rows: &flags,
            fill_color: 0xFFC7CE,
        };
        write_dataset(&path, &ds, "الردود", Some(&highlight)).expect("write");
        assert_eq!(read_dataset(&path).expect("read"), ds);
        let styles = xml_part(&path, "xl/styles.xml");
        assert!(styles.contains("yyyy-mm-dd"));
        assert!(styles.contains("FFC7CE"));
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        write_dataset(&path, &sample(), "الردود", None).expect("first write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).expect("chmod");
        write_dataset(&path, &sample(), "الردود", None).expect("second write");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }

    #[test]
    fn overwrite_leaves_no_temporary_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        write_dataset(&path, &sample(), "الردود", None).expect("first write");
        write_dataset(&path, &Dataset::with_schema(), "الردود", None).expect("second write");
        let entries: Vec<_> = fs::read_dir(dir.path()).expect("read_dir").collect();
        assert_eq!(entries.len(), 1);
        let read = read_dataset(&path).expect("read");
        assert_eq!(read.columns, SCHEMA_COLUMNS.to_vec());
        assert!(read.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        fs::write(&path, b"not a workbook").expect("write");
        assert!(read_dataset(&path).is_err());
    }

    #[test]
    fn invalid_sheet_name_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("responses.xlsx");
        assert!(write_dataset(&path, &sample(), "bad[name]", None).is_err());
        assert!(!path.exists());
    }
}
