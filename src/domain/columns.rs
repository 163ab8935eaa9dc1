//! Configurable CSV column names.

/// Column names used when reading and writing frames. Spelling variants
/// (`MA_Upper` vs `MA_UpperBand`) are handled here, not in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: String,
    pub close: String,
    pub high: String,
    pub low: String,
    pub base: String,
    pub upper: String,
    pub lower: String,
    pub signal: String,
    pub envelope_pct: String,
    pub band_width: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            date: "date".into(),
            close: "close".into(),
            high: "high".into(),
            low: "low".into(),
            base: "MA_Base".into(),
            upper: "MA_Upper".into(),
            lower: "MA_Lower".into(),
            signal: "Signal".into(),
            envelope_pct: "Envelope_Pct".into(),
            band_width: "Band_Width".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_envelope_output() {
        let c = ColumnMap::default();
        assert_eq!(c.date, "date");
        assert_eq!(c.upper, "MA_Upper");
        assert_eq!(c.lower, "MA_Lower");
        assert_eq!(c.signal, "Signal");
    }
}
