//! Series transforms applied before encoding
//!
//! - [`deaccumulate`] turns a cumulative counter into per-interval deltas
//! - [`downsample`] halves a series until it fits the chart's sample cap

/// Sample cap of the image chart service
pub const DEFAULT_SAMPLE_CAP: usize = 200;

/// Per-interval deltas of a cumulative counter.
///
/// The output is one element shorter than the input: `out[i] = v[i+1] - v[i]`.
/// Negative deltas (counter resets) are clamped to 0. A delta involving a
/// `NaN` sample stays `NaN`.
pub fn deaccumulate(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            if delta.is_nan() {
                delta
            } else {
                delta.max(0.0)
            }
        })
        .collect()
}

/// Average consecutive pairs until at most `cap` samples remain.
///
/// Each pass maps `d[2i], d[2i+1]` to their mean; an odd trailing sample
/// is dropped. A `cap` of 0 is treated as 1.
pub fn downsample(values: &[f64], cap: usize) -> Vec<f64> {
    let cap = cap.max(1);
    let mut data = values.to_vec();
    let mut passes = 0u32;
    while data.len() > cap {
        data = data
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();
        passes += 1;
    }
    if passes > 0 {
        tracing::trace!(
            "Downsampled {} -> {} samples in {} pass(es)",
            values.len(),
            data.len(),
            passes
        );
    }
    data
}

/// Number of halving passes [`downsample`] performs for `len` samples
pub fn halving_passes(len: usize, cap: usize) -> u32 {
    let cap = cap.max(1);
    let mut len = len;
    let mut passes = 0;
    while len > cap {
        len /= 2;
        passes += 1;
    }
    passes
}
