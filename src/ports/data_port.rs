//! Tabular data access port trait.

use crate::domain::error::BandtraderError;
use crate::domain::frame::Frame;

pub trait DataPort {
    /// Load a date-indexed frame from `source`, keyed by `date_column`.
    fn load_frame(&self, source: &str, date_column: &str) -> Result<Frame, BandtraderError>;

    /// Persist `frame` to `dest`, date column first.
    fn store_frame(&self, frame: &Frame, dest: &str) -> Result<(), BandtraderError>;
}
