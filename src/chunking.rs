//! Heuristics for choosing chunk and buffer shapes.
//!
//! The longest axis of a dataset is treated as the iteration axis
//! (e.g. samples of an electrical series); it is chunked partially,
//! while the remaining axes (e.g. channels) are kept as whole as the
//! chunk budget allows.
use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

/// Memory limits steering the chunk and buffer heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingLimits {
    /// Upper bound on the byte size of a chunk. Default 10 MB.
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: u64,
    /// Upper bound on the byte size of a write buffer. Default 1 GB.
    #[serde(default = "default_buffer_bytes")]
    pub buffer_bytes: u64,
    /// Minimum run of elements along the iteration axis a chunk should cover,
    /// before the other axes are split. Default 65536.
    #[serde(default = "default_min_contiguous")]
    pub min_contiguous: u64,
}

fn default_chunk_bytes() -> u64 {
    10_000_000
}

fn default_buffer_bytes() -> u64 {
    1_000_000_000
}

fn default_min_contiguous() -> u64 {
    65_536
}

impl Default for ChunkingLimits {
    fn default() -> Self {
        Self {
            chunk_bytes: default_chunk_bytes(),
            buffer_bytes: default_buffer_bytes(),
            min_contiguous: default_min_contiguous(),
        }
    }
}

/// Index of the longest axis; the first one wins ties.
pub fn iteration_axis(shape: &[u64]) -> usize {
    let mut axis = 0;
    for (idx, &n) in shape.iter().enumerate() {
        if n > shape[axis] {
            axis = idx;
        }
    }
    axis
}

fn nbytes(shape: &[u64], itemsize: u64) -> u64 {
    shape.iter().fold(itemsize, |acc, &n| acc.saturating_mul(n))
}

/// All divisors of `n`, ascending.
fn divisors(n: u64) -> Vec<u64> {
    let mut low = Vec::new();
    let mut high = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            low.push(d);
            if d != n / d {
                high.push(n / d);
            }
        }
        d += 1;
    }
    low.extend(high.into_iter().rev());
    low
}

/// Longest run along `axis` that keeps the chunk within `budget` bytes.
fn max_run(chunk: &[u64], axis: usize, itemsize: u64, budget: u64) -> u64 {
    let row = chunk
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != axis)
        .fold(itemsize, |acc, (_, &n)| acc.saturating_mul(n));
    (budget / row).clamp(1, chunk[axis])
}

/// Largest `ceil(n / k)` strictly below `current`.
fn next_partition(n: u64, current: u64) -> u64 {
    let mut parts = n.div_ceil(current);
    loop {
        parts += 1;
        let extent = n.div_ceil(parts);
        if extent < current {
            return extent;
        }
    }
}

/// Step the widest non-iteration axis down via `next` until the run along
/// `axis` reaches `required`, or no axis can step further. Returns the run.
fn shrink_other_axes(
    chunk: &mut [u64],
    axis: usize,
    itemsize: u64,
    limits: &ChunkingLimits,
    required: u64,
    next: impl Fn(usize, u64) -> Option<u64>,
) -> u64 {
    let mut run = max_run(chunk, axis, itemsize, limits.chunk_bytes);
    while run < required {
        let Some((widest, extent)) = (0..chunk.len())
            .filter(|&j| j != axis)
            .filter_map(|j| next(j, chunk[j]).map(|extent| (j, extent)))
            .max_by_key(|&(j, _)| (chunk[j], Reverse(j)))
        else {
            break;
        };
        chunk[widest] = extent;
        run = max_run(chunk, axis, itemsize, limits.chunk_bytes);
        log::trace!("split axis {widest} to {extent}, run {run}");
    }
    run
}

/// Choose a chunk shape for a dataset of `maxshape` with elements of `itemsize` bytes.
///
/// `maxshape` must be non-empty and have no zero extents.
pub fn estimate_chunk_shape(maxshape: &[u64], itemsize: u64, limits: &ChunkingLimits) -> Vec<u64> {
    let total = nbytes(maxshape, itemsize);
    if total <= limits.chunk_bytes {
        return maxshape.to_vec();
    }

    let axis = iteration_axis(maxshape);
    let len = maxshape[axis];
    let required = limits.min_contiguous.min(len.div_ceil(2)).max(1);

    // Divisors keep whole chunks across the other axes; 1 is left to the fallback.
    let axis_divisors: Vec<_> = maxshape
        .iter()
        .enumerate()
        .map(|(j, &n)| if j == axis { Vec::new() } else { divisors(n) })
        .collect();
    let mut chunk = maxshape.to_vec();
    let mut run = shrink_other_axes(&mut chunk, axis, itemsize, limits, required, |j, current| {
        axis_divisors[j]
            .iter()
            .rev()
            .copied()
            .find(|&d| d > 1 && d < current)
    });

    // Awkward extents (e.g. prime channel counts): split into near-even parts instead.
    if run < required {
        chunk = maxshape.to_vec();
        run = shrink_other_axes(&mut chunk, axis, itemsize, limits, required, |j, current| {
            (current > 1).then(|| next_partition(maxshape[j], current))
        });
    }

    // Tile the axis evenly when the whole dataset goes out in one buffer.
    if total <= limits.buffer_bytes {
        let parts = len.div_ceil(run);
        if len % parts == 0 {
            run = len / parts;
        }
    }
    chunk[axis] = run;
    chunk
}

/// Choose a buffer shape: a whole number of chunks along every axis, within `maxshape`.
///
/// `chunk_shape` must not exceed `maxshape` along any axis.
pub fn estimate_buffer_shape(
    maxshape: &[u64],
    chunk_shape: &[u64],
    itemsize: u64,
    limits: &ChunkingLimits,
) -> Vec<u64> {
    let axis = iteration_axis(maxshape);
    let mut buffer: Vec<u64> = maxshape
        .iter()
        .zip(chunk_shape)
        .map(|(&m, &c)| m / c * c)
        .collect();

    let slab_bytes = |buffer: &[u64]| {
        buffer
            .iter()
            .enumerate()
            .map(|(j, &n)| if j == axis { chunk_shape[axis] } else { n })
            .fold(itemsize, |acc, n| acc.saturating_mul(n))
    };

    let mut others: Vec<usize> = (0..buffer.len()).filter(|&j| j != axis).collect();
    others.sort_by_key(|&j| Reverse(buffer[j]));
    for j in others {
        let slab = slab_bytes(&buffer);
        if slab <= limits.buffer_bytes {
            break;
        }
        let without_j = slab / buffer[j];
        let fitting = limits.buffer_bytes / without_j / chunk_shape[j] * chunk_shape[j];
        buffer[j] = fitting.clamp(chunk_shape[j], buffer[j]);
    }

    let slab = slab_bytes(&buffer);
    let max_chunks = maxshape[axis] / chunk_shape[axis];
    let n_chunks = (limits.buffer_bytes / slab).clamp(1, max_chunks);
    buffer[axis] = n_chunks * chunk_shape[axis];
    buffer
}
