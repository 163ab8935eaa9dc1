//! Domain error types.

/// Top-level error type for bandtrader.
#[derive(Debug, thiserror::Error)]
pub enum BandtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("missing required columns: {}; available columns: {}", missing.join(", "), available.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("empty series: {what}")]
    EmptySeries { what: String },

    #[error("invalid date {value:?} at row {row}")]
    InvalidDate { row: usize, value: String },

    #[error("duplicate date {date}")]
    DuplicateDate { date: chrono::NaiveDate },

    #[error("invalid value {value:?} in column {column} on {date}")]
    InvalidValue {
        date: chrono::NaiveDate,
        column: String,
        value: String,
    },

    #[error("data quality check failed: {reason}")]
    DataQuality { reason: String },

    #[error("order rejected on {date}: {reason}")]
    OrderRejected {
        date: chrono::NaiveDate,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BandtraderError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BandtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// CSV content that could be read but not parsed, as opposed to a
    /// file that could not be read at all.
    fn is_malformed_csv(&self) -> bool {
        match self {
            BandtraderError::Csv(e) => matches!(
                e.kind(),
                csv::ErrorKind::UnequalLengths { .. }
                    | csv::ErrorKind::Utf8 { .. }
                    | csv::ErrorKind::Deserialize { .. }
            ),
            _ => false,
        }
    }
}

impl From<&BandtraderError> for std::process::ExitCode {
    fn from(err: &BandtraderError) -> Self {
        let code: u8 = match err {
            e if e.is_malformed_csv() => 3,
            BandtraderError::Io(_) | BandtraderError::Csv(_) => 1,
            BandtraderError::ConfigParse { .. }
            | BandtraderError::ConfigInvalid { .. } => 2,
            BandtraderError::MissingColumns { .. }
            | BandtraderError::EmptySeries { .. }
            | BandtraderError::InvalidDate { .. }
            | BandtraderError::DuplicateDate { .. }
            | BandtraderError::InvalidValue { .. } => 3,
            BandtraderError::DataQuality { .. } => 4,
            BandtraderError::OrderRejected { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_every_name() {
        let err = BandtraderError::MissingColumns {
            missing: vec!["MA_Upper".into(), "MA_Lower".into()],
            available: vec!["date".into(), "close".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("MA_Upper, MA_Lower"));
        assert!(msg.contains("date, close"));
    }

    #[test]
    fn config_invalid_helper() {
        let err = BandtraderError::config_invalid("envelope", "base_window", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid config value [envelope] base_window: must be positive"
        );
    }

    fn code_of(err: &BandtraderError) -> String {
        // ExitCode doesn't implement PartialEq, so compare via Debug
        format!("{:?}", std::process::ExitCode::from(err))
    }

    #[test]
    fn exit_codes_by_family() {
        use std::process::ExitCode;
        let io = BandtraderError::Io(std::io::Error::other("boom"));
        assert_eq!(code_of(&io), format!("{:?}", ExitCode::from(1)));
        let cfg = BandtraderError::config_invalid("strategy", "risk_per_trade", "out of range");
        assert_eq!(code_of(&cfg), format!("{:?}", ExitCode::from(2)));
        let empty = BandtraderError::EmptySeries {
            what: "close".into(),
        };
        assert_eq!(code_of(&empty), format!("{:?}", ExitCode::from(3)));
        let dq = BandtraderError::DataQuality {
            reason: "high below low".into(),
        };
        assert_eq!(code_of(&dq), format!("{:?}", ExitCode::from(4)));
    }

    fn csv_error(data: &str) -> BandtraderError {
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let err = rdr
            .records()
            .find_map(|r| r.err())
            .expect("csv should fail to parse");
        BandtraderError::Csv(err)
    }

    #[test]
    fn ragged_csv_row_is_input_error() {
        use std::process::ExitCode;
        let ragged = csv_error("date,close\n2024-01-01,10\n2024-01-02,11,extra\n");
        assert!(ragged.is_malformed_csv());
        assert_eq!(code_of(&ragged), format!("{:?}", ExitCode::from(3)));
    }

    #[test]
    fn unreadable_csv_file_is_io_error() {
        use std::process::ExitCode;
        let err = match csv::Reader::from_path("/nonexistent/dir/prices.csv") {
            Err(e) => BandtraderError::Csv(e),
            Ok(_) => panic!("expected open failure"),
        };
        assert!(!err.is_malformed_csv());
        assert_eq!(code_of(&err), format!("{:?}", ExitCode::from(1)));
    }
}
