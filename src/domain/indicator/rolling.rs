//! Trailing-window statistics over observation counts.
//!
//! Output is aligned with the input: element `i` covers `values[i+1-window..=i]`
//! and is `None` while fewer than `window` observations exist.

/// Arithmetic mean of each trailing window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if window == 0 {
        out.resize(values.len(), None);
        return out;
    }
    let warmup = window - 1;

    for i in 0..values.len() {
        if i < warmup {
            out.push(None);
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        out.push(Some(slice.iter().sum::<f64>() / window as f64));
    }
    out
}

/// Sample standard deviation (n - 1 denominator) of each trailing window.
///
/// A window of one observation has no sample deviation, so `window < 2`
/// yields all `None`.
pub fn rolling_sample_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if window < 2 {
        out.resize(values.len(), None);
        return out;
    }
    let warmup = window - 1;

    for i in 0..values.len() {
        if i < warmup {
            out.push(None);
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (window - 1) as f64;
        out.push(Some(variance.sqrt()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_warmup() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
    }

    #[test]
    fn mean_window_one_is_identity() {
        let out = rolling_mean(&[5.0, 7.0], 1);
        assert_eq!(out, vec![Some(5.0), Some(7.0)]);
    }

    #[test]
    fn mean_zero_window_is_undefined() {
        assert_eq!(rolling_mean(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn mean_window_longer_than_series() {
        assert_eq!(rolling_mean(&[1.0, 2.0], 5), vec![None, None]);
    }

    #[test]
    fn sample_std_known_values() {
        // 2,4,4,4,5,5,7,9: population std 2.0, sample variance 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_sample_std(&values, 8);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((out[7].unwrap() - expected).abs() < 1e-12);
        assert!(out[..7].iter().all(Option::is_none));
    }

    #[test]
    fn sample_std_constant_is_zero() {
        let out = rolling_sample_std(&[3.0, 3.0, 3.0], 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(0.0));
        assert_eq!(out[2], Some(0.0));
    }

    #[test]
    fn sample_std_needs_two_observations() {
        assert_eq!(rolling_sample_std(&[1.0, 2.0], 1), vec![None, None]);
    }

    #[test]
    fn sample_std_propagates_infinity_as_nan() {
        let out = rolling_sample_std(&[f64::INFINITY, 1.0], 2);
        assert!(out[1].unwrap().is_nan());
    }
}
