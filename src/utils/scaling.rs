// src/utils/scaling.rs
//! Byte encoding of NDVI values.
//!
//! `[-1, 1]` maps linearly onto `[1, 255]`; `0` is kept free as the no-data
//! sentinel. Rounding is half-to-even, so `0.5` encodes to `192` and `-0.5`
//! to `64`.

pub const NODATA: u8 = 0;

const NDVI_MIN: f64 = -1.0;
const NDVI_MAX: f64 = 1.0;
const BYTE_MIN: f64 = 1.0;
const BYTE_MAX: f64 = 255.0;

pub fn normalize(ndvi: f64) -> i32 {
    let scaled = BYTE_MIN + ((ndvi - NDVI_MIN) * (BYTE_MAX - BYTE_MIN)) / (NDVI_MAX - NDVI_MIN);
    scaled.round_ties_even() as i32
}

/// Inverse of [`normalize`]. Applied to raw stored values without clamping.
pub fn denormalize(value: f64) -> f64 {
    NDVI_MIN + ((value - BYTE_MIN) / (BYTE_MAX - BYTE_MIN)) * (NDVI_MAX - NDVI_MIN)
}

/// Encodes one NDVI cell for storage. NaN and anything that does not land
/// strictly above the sentinel become [`NODATA`].
pub fn to_pixel(ndvi: f64) -> u8 {
    if ndvi.is_nan() {
        return NODATA;
    }
    let value = normalize(ndvi);
    if value > 0 {
        value.min(BYTE_MAX as i32) as u8
    } else {
        NODATA
    }
}

pub fn to_pixels(data: &[f64]) -> Vec<u8> {
    data.iter().map(|&v| to_pixel(v)).collect()
}
