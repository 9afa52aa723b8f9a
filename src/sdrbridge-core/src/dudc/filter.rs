// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Windowed-sinc polyphase prototype filter.

use std::f32::consts::PI;

/// Build a Hann-windowed sinc lowpass of `total_len` taps at angular cutoff
/// `cutoff_norm * pi` radians/sample, then normalise each of the
/// `branches` polyphase branches independently so every branch sums to 1
/// (unity DC gain per phase, not just for the whole filter).
///
/// `total_len` must equal `branchlen * branches` for the branch split to be
/// exact; the caller is responsible for that invariant.
pub fn polyphase_taps(total_len: usize, branches: usize, cutoff_norm: f32) -> Vec<f32> {
    let mut taps = windowed_sinc(total_len, cutoff_norm);
    normalize_branches(&mut taps, branches);
    taps
}

fn windowed_sinc(total_len: usize, cutoff_norm: f32) -> Vec<f32> {
    if total_len == 0 {
        return Vec::new();
    }
    let m = (total_len - 1) as f32;
    (0..total_len)
        .map(|n| {
            let shifted = n as f32 - m / 2.0;
            let sinc = if shifted.abs() < 1e-6 {
                cutoff_norm
            } else {
                (PI * cutoff_norm * shifted).sin() / (PI * shifted)
            };
            let hann = if m > 0.0 {
                0.5 - 0.5 * (2.0 * PI * n as f32 / m).cos()
            } else {
                1.0
            };
            sinc * hann
        })
        .collect()
}

/// Scale each polyphase branch `{p, p+branches, p+2*branches, ...}` so it
/// sums to exactly 1.
fn normalize_branches(taps: &mut [f32], branches: usize) {
    if branches == 0 {
        return;
    }
    for p in 0..branches {
        let sum: f32 = taps.iter().skip(p).step_by(branches).sum();
        if sum.abs() > 1e-12 {
            for t in taps.iter_mut().skip(p).step_by(branches) {
                *t /= sum;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_branch_sums_to_one() {
        let branchlen = 11;
        let branches = 4;
        let taps = polyphase_taps(branchlen * branches, branches, 0.5);
        for p in 0..branches {
            let sum: f32 = taps.iter().skip(p).step_by(branches).sum();
            assert!((sum - 1.0).abs() < 1e-6, "branch {p} sum {sum}");
        }
    }

    #[test]
    fn single_branch_matches_whole_filter_normalisation() {
        let taps = polyphase_taps(11, 1, 0.5);
        let sum: f32 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}
