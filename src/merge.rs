use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::HarvestError;
use crate::records::{self, LINK_COLUMN, Record};

/// Tabular file formats the merge writer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Delimited text
    Csv,

    /// Excel workbook
    Spreadsheet,
}

impl TableFormat {
    /// Determines the format from a file extension.
    ///
    /// Anything that is not a spreadsheet extension is treated as
    /// delimited text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext)
                if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls") =>
            {
                TableFormat::Spreadsheet
            }
            _ => TableFormat::Csv,
        }
    }
}

/// In-memory view of a tabular file: named columns and string rows
#[derive(Debug, Default)]
pub struct Dataset {
    /// Column headers in file order
    pub columns: Vec<String>,

    /// Data rows in file order
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Values of one column in row order; rows shorter than the header
    /// yield empty values. An unknown column yields nothing.
    pub fn column(&self, name: &str) -> Vec<String> {
        let Some(index) = self.columns.iter().position(|column| column == name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect()
    }
}

/// Loads a tabular file into memory
pub fn load(path: &Path) -> Result<Dataset, HarvestError> {
    match TableFormat::from_path(path) {
        TableFormat::Csv => load_csv(path),
        TableFormat::Spreadsheet => load_spreadsheet(path),
    }
}

fn load_csv(path: &Path) -> Result<Dataset, HarvestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows.push(row.iter().map(|field| field.to_string()).collect());
    }
    Ok(Dataset { columns, rows })
}

fn load_spreadsheet(path: &Path) -> Result<Dataset, HarvestError> {
    let mut workbook = open_workbook_auto(path)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Dataset::default());
    };
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range
        .rows()
        .map(|cells| cells.iter().map(cell_to_string).collect::<Vec<_>>());
    let columns = rows.next().unwrap_or_default();
    Ok(Dataset {
        columns,
        rows: rows.collect(),
    })
}

/// Renders a spreadsheet cell the way it displays
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) if value.fract() == 0.0 => format!("{}", *value as i64),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    }
}

/// Reads the dedup seed links from a previously exported dataset.
///
/// Rows without a link value seed nothing; an unreadable or missing file
/// seeds nothing either and is never fatal.
pub fn seed_links(path: &Path) -> Vec<String> {
    match load(path) {
        Ok(dataset) => dataset
            .column(LINK_COLUMN)
            .into_iter()
            .filter(|link| !link.is_empty())
            .collect(),
        Err(e) => {
            ::log::warn!(
                "could not read {} for seeding, starting empty: {}",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Appends new records to the dataset at `path`.
///
/// Prior rows keep their order and are never rewritten; new rows land at
/// the end in arrival order. Existing columns keep their positions, and
/// canonical columns the file does not carry yet are appended after them.
/// With nothing to append the file is not touched.
pub fn merge(path: &Path, new_records: &[Record]) -> Result<(), HarvestError> {
    if new_records.is_empty() {
        return Ok(());
    }

    // An unreadable target contributes zero existing rows
    let mut dataset = match load(path) {
        Ok(dataset) => dataset,
        Err(e) => {
            ::log::warn!(
                "could not read existing data from {}: {}",
                path.display(),
                e
            );
            Dataset::default()
        }
    };

    for column in records::COLUMNS {
        if !dataset.columns.iter().any(|existing| existing == column) {
            dataset.columns.push(column.to_string());
        }
    }
    let width = dataset.columns.len();
    for row in &mut dataset.rows {
        row.resize(width, String::new());
    }
    for record in new_records {
        dataset.rows.push(record.to_row(&dataset.columns));
    }

    ::log::info!(
        "appending {} records to {} ({} rows total)",
        new_records.len(),
        path.display(),
        dataset.rows.len()
    );
    match TableFormat::from_path(path) {
        TableFormat::Csv => write_csv(path, &dataset),
        TableFormat::Spreadsheet => write_spreadsheet(path, &dataset),
    }
}

fn write_csv(path: &Path, dataset: &Dataset) -> Result<(), HarvestError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&dataset.columns)?;
    for row in &dataset.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_spreadsheet(path: &Path, dataset: &Dataset) -> Result<(), HarvestError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in dataset.columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }
    for (row_index, row) in dataset.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string(row_index as u32 + 1, col as u16, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
