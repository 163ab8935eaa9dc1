//! CSV file data adapter.

use crate::domain::error::BandtraderError;
use crate::domain::frame::{parse_date, Frame};
use crate::ports::data_port::DataPort;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    /// Relative sources resolve against `base_path`; absolute ones are used as-is.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

impl DataPort for CsvAdapter {
    fn load_frame(&self, source: &str, date_column: &str) -> Result<Frame, BandtraderError> {
        let path = self.resolve(source);
        tracing::debug!(path = %path.display(), "reading csv");
        let mut rdr = csv::Reader::from_path(&path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let duplicates = Frame::duplicate_columns(&headers);
        if !duplicates.is_empty() {
            return Err(BandtraderError::DataQuality {
                reason: format!(
                    "duplicate columns in {}: {}",
                    path.display(),
                    duplicates.join(", ")
                ),
            });
        }

        let date_idx = headers
            .iter()
            .position(|h| h == date_column)
            .ok_or_else(|| BandtraderError::MissingColumns {
                missing: vec![date_column.to_string()],
                available: headers.clone(),
            })?;
        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            // 1-based data row, header excluded
            let row = i + 1;
            let cell = record.get(date_idx).unwrap_or_default();
            let date = parse_date(cell).ok_or_else(|| BandtraderError::InvalidDate {
                row,
                value: cell.to_string(),
            })?;
            let cells = record
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != date_idx)
                .map(|(_, c)| c.to_string())
                .collect();
            rows.push((date, cells));
        }

        let frame = Frame::new(date_column, columns, rows)?;
        tracing::debug!(rows = frame.len(), columns = frame.columns().len(), "csv loaded");
        Ok(frame)
    }

    fn store_frame(&self, frame: &Frame, dest: &str) -> Result<(), BandtraderError> {
        let path = self.resolve(dest);
        let mut wtr = csv::Writer::from_path(&path)?;

        let mut header = Vec::with_capacity(frame.columns().len() + 1);
        header.push(frame.date_column());
        header.extend(frame.columns().iter().map(String::as_str));
        wtr.write_record(&header)?;

        for (i, date) in frame.dates().iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            if let Some(cells) = frame.row(i) {
                record.extend(cells.iter().cloned());
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        tracing::debug!(path = %path.display(), rows = frame.len(), "csv written");
        Ok(())
    }
}
