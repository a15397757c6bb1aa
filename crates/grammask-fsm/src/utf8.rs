//! Codepoint-range to byte-range expansion.
//!
//! A codepoint range compiles to a small set of byte-range *sequences*:
//! each sequence is a chain of inclusive byte ranges, one per UTF-8 byte
//! position. The split is exact - a byte string matches some sequence iff
//! it is the UTF-8 encoding of a codepoint in the input range.

use grammask_core::encoding::encode_utf8;
pub use grammask_core::encoding::Codepoint;

/// Inclusive byte range.
pub type ByteRange = (u8, u8);

/// Maximum valid codepoint.
pub const MAX_CODEPOINT: Codepoint = 0x10FFFF;

/// Lowest byte of a UTF-8 continuation position.
const CONT_MIN: u8 = 0x80;
/// Highest byte of a UTF-8 continuation position.
const CONT_MAX: u8 = 0xBF;

/// Codepoint spans sharing one encoded length, with surrogates cut out of
/// the three-byte span.
const LENGTH_SPANS: [(Codepoint, Codepoint); 5] = [
    (0x0, 0x7F),
    (0x80, 0x7FF),
    (0x800, 0xD7FF),
    (0xE000, 0xFFFF),
    (0x10000, 0x10FFFF),
];

/// Expand `[lo, hi]` (inclusive, both valid codepoints) into byte-range
/// sequences. Surrogate codepoints are skipped.
pub fn codepoint_range_to_byte_sequences(lo: Codepoint, hi: Codepoint) -> Vec<Vec<ByteRange>> {
    debug_assert!(lo <= hi, "invalid codepoint range {lo}..={hi}");
    let mut out = Vec::new();
    for &(span_lo, span_hi) in &LENGTH_SPANS {
        let a = lo.max(span_lo);
        let b = hi.min(span_hi);
        if a > b {
            continue;
        }
        let start = encode_utf8(a);
        let end = encode_utf8(b);
        debug_assert_eq!(start.len(), end.len());
        split_same_length(&start, &end, &mut out);
    }
    out
}

/// Expand a byte-string interval `[start, end]` of equal encoded length.
///
/// Within one encoded length the byte strings order lexicographically with
/// the codepoints, and every continuation position spans the full
/// `0x80..=0xBF` window, so the interval splits into at most a handful of
/// rectangular sequences.
fn split_same_length(start: &[u8], end: &[u8], out: &mut Vec<Vec<ByteRange>>) {
    if start.len() == 1 {
        out.push(vec![(start[0], end[0])]);
        return;
    }
    if start[0] == end[0] {
        // Shared lead byte: recurse on the tail.
        let mark = out.len();
        split_same_length(&start[1..], &end[1..], out);
        for seq in &mut out[mark..] {
            seq.insert(0, (start[0], start[0]));
        }
        return;
    }
    let tail_len = start.len() - 1;
    if start[1..].iter().any(|&b| b != CONT_MIN) {
        // Peel the partial first lead byte.
        let mut upper = vec![start[0]];
        upper.extend(std::iter::repeat(CONT_MAX).take(tail_len));
        split_same_length(start, &upper, out);
        let mut rest = vec![start[0] + 1];
        rest.extend(std::iter::repeat(CONT_MIN).take(tail_len));
        split_same_length(&rest, end, out);
    } else if end[1..].iter().any(|&b| b != CONT_MAX) {
        // Peel the partial last lead byte.
        let mut lower = vec![end[0] - 1];
        lower.extend(std::iter::repeat(CONT_MAX).take(tail_len));
        split_same_length(start, &lower, out);
        let mut rest = vec![end[0]];
        rest.extend(std::iter::repeat(CONT_MIN).take(tail_len));
        split_same_length(&rest, end, out);
    } else {
        // Full rectangle: lead range followed by full continuation windows.
        let mut seq = vec![(start[0], end[0])];
        seq.extend(std::iter::repeat((CONT_MIN, CONT_MAX)).take(tail_len));
        out.push(seq);
    }
}

/// Sort, clamp, and merge codepoint ranges; negate against the valid
/// codepoint space when requested. Returns the normalized range list.
pub fn normalize_class_ranges(
    ranges: &[(Codepoint, Codepoint)],
    negated: bool,
) -> Vec<(Codepoint, Codepoint)> {
    let mut sorted: Vec<(Codepoint, Codepoint)> = ranges
        .iter()
        .filter_map(|&(lo, hi)| {
            let lo = lo.max(0);
            let hi = hi.min(MAX_CODEPOINT);
            (lo <= hi).then_some((lo, hi))
        })
        .collect();
    sorted.sort_unstable();
    let mut merged: Vec<(Codepoint, Codepoint)> = Vec::new();
    for (lo, hi) in sorted {
        match merged.last_mut() {
            Some(last) if lo <= last.1 + 1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    if !negated {
        return merged;
    }
    let mut complement = Vec::new();
    let mut next = 0;
    for (lo, hi) in merged {
        if next < lo {
            complement.push((next, lo - 1));
        }
        next = next.max(hi + 1);
    }
    if next <= MAX_CODEPOINT {
        complement.push((next, MAX_CODEPOINT));
    }
    complement
}

/// Expand a character class into byte-range sequences.
pub fn class_to_byte_sequences(
    ranges: &[(Codepoint, Codepoint)],
    negated: bool,
) -> Vec<Vec<ByteRange>> {
    let mut out = Vec::new();
    for (lo, hi) in normalize_class_ranges(ranges, negated) {
        out.extend(codepoint_range_to_byte_sequences(lo, hi));
    }
    out
}
