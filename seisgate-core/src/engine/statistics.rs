//! Window statistics behind the surface attributes.

use crate::tokens::Attribute;

/// Compute `attribute` over `window`, where `reference` indexes the sample
/// at the surface itself. `window` must be non-empty.
pub fn compute(attribute: Attribute, window: &[f64], reference: usize) -> f32 {
    let n = window.len() as f64;
    let value = match attribute {
        Attribute::SampleValue => window[reference.min(window.len() - 1)],
        Attribute::Min => window.iter().copied().fold(f64::INFINITY, f64::min),
        Attribute::Max => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Attribute::MaxAbs => window.iter().map(|v| v.abs()).fold(0.0, f64::max),
        Attribute::Mean => window.iter().sum::<f64>() / n,
        Attribute::MeanAbs => window.iter().map(|v| v.abs()).sum::<f64>() / n,
        Attribute::MeanPos => mean_where(window, |v| v > 0.0),
        Attribute::MeanNeg => mean_where(window, |v| v < 0.0),
        Attribute::Median => median(window),
        Attribute::Rms => (window.iter().map(|v| v * v).sum::<f64>() / n).sqrt(),
        Attribute::Var => variance(window),
        Attribute::Sd => variance(window).sqrt(),
        Attribute::SumPos => window.iter().filter(|v| **v > 0.0).sum(),
        Attribute::SumNeg => window.iter().filter(|v| **v < 0.0).sum(),
    };
    value as f32
}

fn mean_where(window: &[f64], keep: impl Fn(f64) -> bool) -> f64 {
    let (sum, count) = window
        .iter()
        .copied()
        .filter(|v| keep(*v))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn median(window: &[f64]) -> f64 {
    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

/// Population variance.
fn variance(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
