//! Bootloader memory images store code in 32-byte bit-striped blocks: bit `j`
//! of input byte `i` belongs to byte `j * 4 + i / 8` of the block, at bit
//! `i % 8`. The image has to be transposed back into byte order before the
//! instruction stream can be walked.

use std::ops::Range;

/// Bytes per bit-striped block.
pub const BLOCK_BYTES: usize = 32;

/// Transposes the first `total_bytes` bytes of a bit-striped image into plain
/// byte order. Missing input bytes read as zero and the result is padded to a
/// whole number of blocks.
#[must_use]
pub fn transpose(input: &[u8], total_bytes: usize) -> Vec<u8> {
    let mut output = vec![0; total_bytes.next_multiple_of(BLOCK_BYTES)];

    for i in 0..total_bytes {
        let byte = input.get(i).copied().unwrap_or_default();
        for plane in 0..8 {
            let bit = (byte >> plane) & 1;
            output[striped_index(i, plane)] |= bit << (i % 8);
        }
    }

    trace_dump(&output[..total_bytes]);
    output
}

/// Transposes the `range` of a bit-striped `image` into plain byte order.
///
/// Blocks are counted from `range.start` and always transposed whole, so a
/// partial last block takes the rest of its bytes from the image beyond the
/// range. Only bytes past the end of the image read as zero.
#[must_use]
pub fn transpose_range(image: &[u8], range: Range<usize>) -> Vec<u8> {
    let count = range.len();
    let blocks = count.next_multiple_of(BLOCK_BYTES);
    let end = range.start.saturating_add(blocks).min(image.len());

    let mut plain = transpose(image.get(range.start..end).unwrap_or_default(), blocks);
    plain.truncate(count);
    plain
}

/// Inverse of [`transpose`]: stripes plain bytes back into image order. The
/// input is zero-padded to a whole number of blocks.
#[must_use]
pub fn untranspose(input: &[u8]) -> Vec<u8> {
    let length = input.len().next_multiple_of(BLOCK_BYTES);
    let mut output = vec![0; length];

    for (i, byte) in output.iter_mut().enumerate() {
        for plane in 0..8 {
            let source = input.get(striped_index(i, plane)).copied().unwrap_or_default();
            *byte |= ((source >> (i % 8)) & 1) << plane;
        }
    }

    output
}

const fn striped_index(i: usize, plane: usize) -> usize {
    (i / BLOCK_BYTES) * BLOCK_BYTES + plane * 4 + (i % BLOCK_BYTES) / 8
}

fn trace_dump(bytes: &[u8]) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }

    for (line, chunk) in bytes.chunks(16).enumerate() {
        let hex: String = chunk.iter().map(|byte| format!("{byte:02x} ")).collect();
        tracing::trace!("{:04x}: {hex}", line * 16);
    }
}
