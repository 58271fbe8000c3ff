//! Channel interleave for the record queue.
//!
//! Converts `CH` separate channel blocks into one frame group, where every
//! frame is `[i16; CH]` holding one sample per channel. Flattened, sample
//! `s` of channel `c` lands at index `s * CH + c`:
//!
//! ```text
//! ch0: a0 a1 a2 ...
//! ch1: b0 b1 b2 ...      →   a0 b0 a1 b1 a2 b2 ...
//! ```
//!
//! `CH` is a const generic, so the arity dispatch below is resolved at
//! compile time and each recorder gets a straight-line copy loop.

/// Interleave `CH` channel blocks into `dest`.
///
/// # Panics
///
/// Debug-asserts that every block holds exactly `dest.len()` samples.
#[inline]
pub fn interleave<const CH: usize>(dest: &mut [[i16; CH]], blocks: &[&[i16]; CH]) {
    for block in blocks {
        debug_assert_eq!(block.len(), dest.len());
    }

    match CH {
        1 => interleave_mono(dest.as_flattened_mut(), blocks[0]),
        2 => interleave_lr(dest.as_flattened_mut(), blocks[0], blocks[CH - 1]),
        _ => {
            for (s, frame) in dest.iter_mut().enumerate() {
                for (c, sample) in frame.iter_mut().enumerate() {
                    *sample = blocks[c][s];
                }
            }
        }
    }
}

/// Single channel: the frame group is the block itself.
#[inline]
fn interleave_mono(dest: &mut [i16], src: &[i16]) {
    dest.copy_from_slice(src);
}

/// Two channels: alternate left and right samples.
#[inline]
fn interleave_lr(dest: &mut [i16], left: &[i16], right: &[i16]) {
    for ((frame, &l), &r) in dest.chunks_exact_mut(2).zip(left).zip(right) {
        frame[0] = l;
        frame[1] = r;
    }
}
