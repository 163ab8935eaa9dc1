#![allow(dead_code)]

use bandtrader::domain::error::BandtraderError;
use bandtrader::domain::frame::Frame;
use bandtrader::domain::price::PricePoint;
use bandtrader::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory data port. Stored frames can be loaded back by name.
pub struct MockDataPort {
    pub frames: RefCell<HashMap<String, Frame>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            frames: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_frame(self, name: &str, frame: Frame) -> Self {
        self.frames.borrow_mut().insert(name.to_string(), frame);
        self
    }

    pub fn get(&self, name: &str) -> Option<Frame> {
        self.frames.borrow().get(name).cloned()
    }
}

impl DataPort for MockDataPort {
    fn load_frame(&self, source: &str, _date_column: &str) -> Result<Frame, BandtraderError> {
        self.get(source).ok_or_else(|| {
            BandtraderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no frame named {}", source),
            ))
        })
    }

    fn store_frame(&self, frame: &Frame, dest: &str) -> Result<(), BandtraderError> {
        self.frames
            .borrow_mut()
            .insert(dest.to_string(), frame.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting 2024-01-01.
pub fn make_prices(closes: &[f64]) -> Vec<PricePoint> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(start + chrono::Duration::days(i as i64), c))
        .collect()
}

pub fn price_frame(closes: &[f64]) -> Frame {
    let rows = make_prices(closes)
        .into_iter()
        .map(|p| (p.date, vec![p.close.to_string()]))
        .collect();
    Frame::new("date", vec!["close".into()], rows).unwrap()
}

/// Ten flat closes at 10.0 followed by a jump to 11.0.
pub fn flat_then_jump() -> Vec<f64> {
    let mut closes = vec![10.0; 10];
    closes.push(11.0);
    closes
}

/// Gentle zig-zag that trends up, breaks down, then recovers.
pub fn trending_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            let trend = if i < len / 2 { t * 0.4 } else { (len - i) as f64 * 0.4 };
            100.0 + trend + if i % 2 == 0 { 0.3 } else { -0.3 }
        })
        .collect()
}

pub fn price_csv(closes: &[f64]) -> String {
    let mut out = String::from("date,close\n");
    for p in make_prices(closes) {
        out.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.close));
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
