//! Run-length encoding of a single character stream.
//!
//! Each maximal run is written as the character followed by its length in
//! decimal, with the length omitted for runs of one. Digits are therefore
//! reserved as count markers and never appear as stream symbols.

use crate::error::DecodeError;

/// Compresses `input` with run-length encoding.
pub fn compress(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.next_if_eq(&c).is_some() {
            run += 1;
        }
        out.push(c);
        if run > 1 {
            out.push_str(&run.to_string());
        }
    }
    out
}

/// Decompresses a run-length encoded stream.
pub fn decompress(input: &str) -> Result<String, DecodeError> {
    let runs = parse_runs(input, "stream")?;
    let total = total_len(&runs, "stream")?;
    Ok(expand(&runs, total))
}

/// Decompresses a stream that must expand to exactly `expected` characters.
///
/// The expanded length is computed from the run counts before anything is
/// materialized, so a huge count is rejected without allocating.
pub(crate) fn decompress_exact(
    input: &str,
    expected: usize,
    field: &'static str,
) -> Result<String, DecodeError> {
    let runs = parse_runs(input, field)?;
    let actual = total_len(&runs, field)?;
    if actual != expected {
        return Err(DecodeError::LengthMismatch { field, expected, actual });
    }
    Ok(expand(&runs, actual))
}

fn parse_runs(input: &str, field: &'static str) -> Result<Vec<(char, usize)>, DecodeError> {
    let mut runs = Vec::new();
    let mut chars = input.chars().enumerate().peekable();
    while let Some((position, c)) = chars.next() {
        if c.is_ascii_digit() {
            return Err(DecodeError::DanglingRunLength { field, position });
        }
        let mut count: Option<usize> = None;
        while let Some((_, d)) = chars.next_if(|(_, d)| d.is_ascii_digit()) {
            let digit = d.to_digit(10).unwrap_or_default() as usize;
            count = count
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|n| n.checked_add(digit))
                .map(Some)
                .ok_or(DecodeError::RunLengthOverflow { field })?;
        }
        runs.push((c, count.unwrap_or(1)));
    }
    Ok(runs)
}

fn total_len(runs: &[(char, usize)], field: &'static str) -> Result<usize, DecodeError> {
    runs.iter().try_fold(0usize, |acc, &(_, n)| {
        acc.checked_add(n)
            .ok_or(DecodeError::RunLengthOverflow { field })
    })
}

fn expand(runs: &[(char, usize)], len: usize) -> String {
    let mut out = String::with_capacity(len);
    for &(c, n) in runs {
        out.extend(std::iter::repeat_n(c, n));
    }
    out
}
