//! Channel up/down-mixing between canonical frames.
//!
//! Policy per output channel `c`, with `n_in` source channels:
//! - fewer outputs than inputs: every output gets the mean of all inputs
//! - `c < n_in`: pass `input[c]` straight through
//! - mono source: broadcast the single channel
//! - otherwise: mean of all inputs

/// Remap one frame. `input` and `output` are sized to their channel counts.
pub fn remap(input: &[f32], output: &mut [f32]) {
    let n_in = input.len();
    if n_in == 0 {
        output.fill(0.0);
        return;
    }

    if output.len() == n_in {
        output.copy_from_slice(input);
        return;
    }

    let mean = || input.iter().sum::<f32>() / n_in as f32;

    if output.len() < n_in {
        output.fill(mean());
        return;
    }

    output[..n_in].copy_from_slice(input);
    let fill = if n_in == 1 { input[0] } else { mean() };
    output[n_in..].fill(fill);
}

/// Remap `frames` interleaved frames from `in_channels` to `out_channels`.
pub fn remap_block(
    input: &[f32],
    in_channels: usize,
    output: &mut [f32],
    out_channels: usize,
    frames: usize,
) {
    for (src, dst) in input
        .chunks_exact(in_channels)
        .zip(output.chunks_exact_mut(out_channels))
        .take(frames)
    {
        remap(src, dst);
    }
}
