// Export encoders - CSV text and XLSX workbooks from a row-set
use crate::domain::report::ExportFormat;
use crate::domain::row_set::{RowSet, cell_text};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::{Number, Value};
use thiserror::Error;

const MAX_SHEET_NAME: usize = 31;

/// Largest magnitude below which every integer has an exact f64
const MAX_EXACT_INTEGER: u64 = 1 << 53;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer could not be flushed: {0}")]
    Io(#[from] std::io::Error),
    #[error("spreadsheet encoding failed: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("table does not fit in a worksheet")]
    TooLarge,
}

pub fn encode(table: &RowSet, format: ExportFormat, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(table),
        ExportFormat::Xlsx => to_xlsx(table, sheet_name),
    }
}

/// Header row plus one record per row, cells rendered with [`cell_text`].
/// A table without columns encodes to an empty document.
pub fn to_csv(table: &RowSet) -> Result<Vec<u8>, ExportError> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(table.columns.iter().map(|column| cell_text(row.get(column))))?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// One worksheet with a header row. Numbers and booleans keep their cell
/// types, null cells stay blank and everything else is written as text.
/// Integers beyond f64 precision are written as text so no digit is lost.
pub fn to_xlsx(table: &RowSet, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        let name: String = sheet_name.chars().take(MAX_SHEET_NAME).collect();
        worksheet.set_name(name)?;

        for (index, column) in table.columns.iter().enumerate() {
            worksheet.write_string(0, column_number(index)?, column.as_str())?;
        }

        for (row_index, row) in table.rows.iter().enumerate() {
            let row_number = u32::try_from(row_index + 1).map_err(|_| ExportError::TooLarge)?;
            for (index, column) in table.columns.iter().enumerate() {
                let col = column_number(index)?;
                match row.get(column) {
                    None | Some(Value::Null) => {}
                    Some(Value::Bool(flag)) => {
                        worksheet.write_boolean(row_number, col, *flag)?;
                    }
                    Some(Value::Number(number)) => match exact_f64(number) {
                        Some(n) => {
                            worksheet.write_number(row_number, col, n)?;
                        }
                        None => {
                            worksheet.write_string(row_number, col, number.to_string())?;
                        }
                    },
                    other => {
                        worksheet.write_string(row_number, col, cell_text(other))?;
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn exact_f64(number: &Number) -> Option<f64> {
    if let Some(n) = number.as_i64() {
        return (n.unsigned_abs() <= MAX_EXACT_INTEGER).then_some(n as f64);
    }
    if let Some(n) = number.as_u64() {
        return (n <= MAX_EXACT_INTEGER).then_some(n as f64);
    }
    number.as_f64()
}

fn column_number(index: usize) -> Result<u16, ExportError> {
    u16::try_from(index).map_err(|_| ExportError::TooLarge)
}
