use serde::{Deserialize, Serialize};

use crate::error::CccError;
use crate::simulation::sensitivity::SimulationSample;
use crate::CccResult;

/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Percentile summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// A single histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

/// Shape of the simulated CCC distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDistribution {
    pub sample_count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
    pub histogram: Vec<HistogramBin>,
}

/// Linearly interpolated percentile (`p` in 0..=100) of ascending values.
fn interpolated_percentile(ascending: &[f64], p: f64) -> f64 {
    let last = ascending.len() - 1;
    let position = p / 100.0 * last as f64;
    let below = position.floor() as usize;
    let weight = position - below as f64;
    match ascending.get(below + 1) {
        Some(&next) if weight > 0.0 => ascending[below] + (next - ascending[below]) * weight,
        _ => ascending[below.min(last)],
    }
}

/// Equal-width bins spanning the ascending, non-empty values. A flat sample
/// collapses into a single bin.
fn equal_width_bins(ascending: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (lo, hi) = (ascending[0], ascending[ascending.len() - 1]);
    let total = ascending.len() as f64;
    let span = hi - lo;
    let bins = if span.abs() < f64::EPSILON { 1 } else { bins };
    let width = span / bins as f64;

    let mut counts = vec![0u32; bins];
    for &v in ascending {
        let slot = if width > 0.0 {
            (((v - lo) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[slot] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
            frequency: f64::from(count) / total,
        })
        .collect()
}

/// Summarise simulated cycles: moments, percentiles and a histogram.
pub fn summarize_samples(
    samples: &[SimulationSample],
    num_bins: usize,
) -> CccResult<SampleDistribution> {
    if samples.is_empty() {
        return Err(CccError::EmptyDataset(
            "No simulation samples to summarise".into(),
        ));
    }
    if num_bins == 0 {
        return Err(CccError::InvalidConfiguration {
            field: "histogram_bins".into(),
            reason: "Must be at least 1".into(),
        });
    }

    let mut values: Vec<f64> = samples.iter().map(|s| s.simulated_ccc).collect();
    values.sort_by(f64::total_cmp);
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(SampleDistribution {
        sample_count: values.len(),
        mean,
        median: interpolated_percentile(&values, 50.0),
        std_dev: variance.sqrt(),
        min: values[0],
        max: values[values.len() - 1],
        percentiles: Percentiles {
            p5: interpolated_percentile(&values, 5.0),
            p10: interpolated_percentile(&values, 10.0),
            p25: interpolated_percentile(&values, 25.0),
            p50: interpolated_percentile(&values, 50.0),
            p75: interpolated_percentile(&values, 75.0),
            p90: interpolated_percentile(&values, 90.0),
            p95: interpolated_percentile(&values, 95.0),
        },
        histogram: equal_width_bins(&values, num_bins),
    })
}

/// Share of samples whose simulated CCC is strictly above `threshold`.
pub fn probability_above(samples: &[SimulationSample], threshold: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let above = samples
        .iter()
        .filter(|s| s.simulated_ccc > threshold)
        .count();
    above as f64 / samples.len() as f64
}
