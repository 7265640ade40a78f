//! Random partition of a quantity into positive parts.
//!
//! The total is scaled to an integer number of units at a fixed decimal
//! precision, cut at distinct random points, and converted back. Every part
//! is at least one unit, so no part is ever zero.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::index;
use rand_mt::Mt19937GenRand32;
use thiserror::Error;

/// Decimal places used when no precision is given.
pub const DEFAULT_DECIMALS: u32 = 6;

/// Largest scaled total that still maps one-to-one onto an `f64`.
const MAX_SCALED: f64 = 9_007_199_254_740_992.0;

/// Errors from splitting a total.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    /// The total was NaN or infinite.
    #[error("total must be finite, got {total}")]
    NonFinite { total: f64 },

    /// The total has too few units to place the required distinct cuts.
    #[error("cannot cut {total} into {parts} positive parts at {decimals} decimal places")]
    TooSmall {
        total: f64,
        parts: usize,
        decimals: u32,
    },

    /// The scaled total does not fit the integer range used for cutting.
    #[error("{total} at {decimals} decimal places is out of range")]
    OutOfRange { total: f64, decimals: u32 },
}

/// Splits `total` into `parts` random positive values, optionally seeded.
///
/// A seeded split draws its cut points from an MT19937 generator keyed with
/// the seed's 32-bit words, so a given seed always yields the same parts.
/// Without a seed the split draws from the thread-local generator and varies
/// from run to run.
pub fn split(total: f64, parts: usize, seed: Option<u64>) -> Result<Vec<f64>, SplitError> {
    match seed {
        Some(seed) => {
            let mut sampler = TwisterSampler::new(seed);
            partition(total, parts, DEFAULT_DECIMALS, |len, amount| {
                sampler.sample(len, amount)
            })
        }
        None => split_with(total, parts, DEFAULT_DECIMALS, &mut rand::rng()),
    }
}

/// Splits `total` into `parts` values drawing cut points from `rng`.
///
/// The result sums to `total` rounded to `decimals` places; any drift from
/// per-part rounding is folded into the largest part.
pub fn split_with<R: Rng + ?Sized>(
    total: f64,
    parts: usize,
    decimals: u32,
    rng: &mut R,
) -> Result<Vec<f64>, SplitError> {
    partition(total, parts, decimals, |len, amount| {
        index::sample(rng, len, amount).into_iter().collect()
    })
}

/// Scales `total`, places `parts - 1` distinct cuts and converts back.
///
/// `draw(len, amount)` returns `amount` distinct indices below `len`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
fn partition<F>(total: f64, parts: usize, decimals: u32, draw: F) -> Result<Vec<f64>, SplitError>
where
    F: FnOnce(usize, usize) -> Vec<usize>,
{
    if !total.is_finite() {
        return Err(SplitError::NonFinite { total });
    }
    match parts {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![round_to(total, decimals)]),
        _ => {}
    }

    let scale = 10f64.powi(decimals as i32);
    let scaled = (total * scale).round();
    if !scaled.is_finite() || scaled > MAX_SCALED {
        return Err(SplitError::OutOfRange { total, decimals });
    }
    // Cuts are drawn from [1, scaled - 1], which must hold parts - 1 values.
    if scaled < parts as f64 {
        return Err(SplitError::TooSmall {
            total,
            parts,
            decimals,
        });
    }
    let scaled = scaled as u64;

    let mut cuts: Vec<u64> = draw((scaled - 1) as usize, parts - 1)
        .into_iter()
        .map(|i| i as u64 + 1)
        .collect();
    cuts.sort_unstable();

    let mut result = Vec::with_capacity(parts);
    let mut previous = 0;
    for cut in cuts.into_iter().chain(std::iter::once(scaled)) {
        result.push(round_to((cut - previous) as f64 / scale, decimals));
        previous = cut;
    }

    let diff = round_to(total - result.iter().sum::<f64>(), decimals);
    if diff.abs() > 0.0 {
        let largest = largest_index(&result);
        result[largest] = round_to(result[largest] + diff, decimals);
    }

    Ok(result)
}

/// Sampling without replacement over MT19937.
///
/// Small populations are drawn from a shrinking pool; large ones by
/// rejecting repeats against a set of chosen indices.
struct TwisterSampler {
    mt: Mt19937GenRand32,
}

impl TwisterSampler {
    /// Keys the generator with the seed's 32-bit words, low word first.
    #[allow(clippy::cast_possible_truncation)]
    fn new(seed: u64) -> Self {
        let low = seed as u32;
        let high = (seed >> 32) as u32;
        let key = if high == 0 { vec![low] } else { vec![low, high] };
        Self {
            mt: Mt19937GenRand32::new_with_key(key),
        }
    }

    /// `bits` random bits, filling 32-bit words from the least significant.
    fn random_bits(&mut self, bits: u32) -> u64 {
        let mut value = 0u64;
        let mut remaining = bits;
        let mut shift = 0;
        while remaining > 0 {
            let mut word = u64::from(self.mt.next_u32());
            if remaining < 32 {
                word >>= 32 - remaining;
            }
            value |= word << shift;
            shift += 32;
            remaining = remaining.saturating_sub(32);
        }
        value
    }

    /// Uniform value in `[0, n)` by rejection on `n.bit_length()` bits.
    fn below(&mut self, n: u64) -> u64 {
        let bits = u64::BITS - n.leading_zeros();
        loop {
            let candidate = self.random_bits(bits);
            if candidate < n {
                return candidate;
            }
        }
    }

    /// `amount` distinct indices below `len`, in selection order.
    #[allow(clippy::cast_possible_truncation)]
    fn sample(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let mut set_size = 21;
        if amount > 5 {
            let mut power = 1;
            while power < amount * 3 {
                power *= 4;
            }
            set_size += power;
        }

        let mut chosen = Vec::with_capacity(amount);
        if len <= set_size {
            let mut pool: Vec<usize> = (0..len).collect();
            for i in 0..amount {
                let j = self.below((len - i) as u64) as usize;
                chosen.push(pool[j]);
                pool[j] = pool[len - i - 1];
            }
        } else {
            let mut selected = HashSet::with_capacity(amount);
            for _ in 0..amount {
                let mut j = self.below(len as u64) as usize;
                while !selected.insert(j) {
                    j = self.below(len as u64) as usize;
                }
                chosen.push(j);
            }
        }
        chosen
    }
}

/// Rounds `value` to `decimals` places.
#[allow(clippy::cast_possible_wrap)]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Index of the element with the largest magnitude, first one on ties.
fn largest_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if value.abs() > values[best].abs() {
            best = i;
        }
    }
    best
}
