// src/processing/ndvi.rs
use rayon::prelude::*;

use crate::error::{NdviError, Result};

/// `(nir - red) / (nir + red)` clipped to `[-1, 1]`.
///
/// A zero denominator yields NaN for that cell instead of an error.
pub fn compute_ndvi(red: &[f64], nir: &[f64]) -> Result<Vec<f64>> {
    if red.len() != nir.len() {
        return Err(NdviError::Validation(format!(
            "band lengths differ: red {} vs nir {}",
            red.len(),
            nir.len()
        )));
    }

    let ndvi = red
        .par_iter()
        .zip(nir.par_iter())
        .map(|(&r, &n)| ndvi_cell(r, n))
        .collect();
    Ok(ndvi)
}

#[inline]
pub fn ndvi_cell(red: f64, nir: f64) -> f64 {
    let sum = nir + red;
    if sum == 0.0 {
        return f64::NAN;
    }
    // clamp keeps NaN as NaN
    ((nir - red) / sum).clamp(-1.0, 1.0)
}
