// src/utils/stats.rs
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

/// Min, max, median and mean of a sample. All NaN when the sample is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub mean: f64,
}

impl Summary {
    pub const EMPTY: Summary = Summary {
        min: f64::NAN,
        max: f64::NAN,
        median: f64::NAN,
        mean: f64::NAN,
    };

    pub fn is_empty(&self) -> bool {
        self.min.is_nan() && self.max.is_nan() && self.median.is_nan() && self.mean.is_nan()
    }
}

/// NaN entries are ignored.
pub fn summarize(values: &[f64]) -> Summary {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Summary::EMPTY;
    }
    sorted.sort_by(f64::total_cmp);

    let (min, max) = match sorted.iter().minmax() {
        MinMaxResult::OneElement(v) => (*v, *v),
        MinMaxResult::MinMax(lo, hi) => (*lo, *hi),
        MinMaxResult::NoElements => return Summary::EMPTY,
    };

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

    Summary { min, max, median, mean }
}
