//! Bollinger Bands.

/// One Bollinger Bands observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Band {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Population standard deviation around `mean`.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance: f64 =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Bollinger Bands: trailing mean ± `mult` population standard deviations.
///
/// `None` for indices `< period - 1`.
pub fn bollinger_bands(closes: &[f64], period: usize, mult: f64) -> Vec<Option<Band>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return result;
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let middle = window.iter().sum::<f64>() / period as f64;
        let sigma = std_dev(window, middle);
        result[i] = Some(Band {
            upper: middle + mult * sigma,
            middle,
            lower: middle - mult * sigma,
        });
    }

    result
}
