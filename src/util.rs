use std::num::ParseIntError;

use snafu::{ensure, ResultExt, Snafu};

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("unknown preset {name:?}, expected one of mt19937, mt19937_64, mt11213b"))]
    UnknownPreset { name: String },

    #[snafu(display("custom parameter set needs 13 values, got {got}"))]
    ParameterCount { got: usize },

    #[snafu(display("invalid parameter set: {reason}"))]
    InvalidParameters { reason: String },

    #[snafu(display("need at least {needed} observed outputs, got {got}"))]
    ObservedTooShort { needed: usize, got: usize },

    #[snafu(display("word {value:#x} at position {index} does not fit in {w} bits"))]
    WordOutOfRange { index: usize, value: u64, w: u32 },

    #[snafu(display("state must hold {expected} words, got {got}"))]
    StateLength { expected: usize, got: usize },

    #[snafu(display("state index {index} is outside 0..={n}"))]
    StateIndex { index: usize, n: usize },

    #[snafu(display("twist cannot be inverted: {reason}"))]
    IrreversibleTwist { reason: &'static str },

    #[snafu(display("line {line} is not an unsigned integer"))]
    ParseWord { line: usize, source: ParseIntError },
}

pub fn word_mask(w: u32) -> u64 {
    if w >= 64 { u64::MAX }
    else       { (1 << w) - 1 }
}

#[test]
fn test_word_mask() {
    assert_eq!(word_mask(32), 0xffff_ffff);
    assert_eq!(word_mask(64), u64::MAX);
    assert_eq!(word_mask(2), 0b11);
}

// Every observation has to be a `w`-bit word before any inversion runs
pub(crate) fn check_words(words: &[u64], w: u32) -> Result<(), Error> {
    let mask = word_mask(w);
    for (index, &value) in words.iter().enumerate() {
        ensure!(value & !mask == 0, WordOutOfRangeSnafu { index, value, w });
    }
    Ok(())
}

#[test]
fn test_check_words() {
    assert_eq!(Ok(()), check_words(&[0, 1, 0xffff_ffff], 32));
    assert_eq!(
        Err(Error::WordOutOfRange { index: 1, value: 1 << 32, w: 32 }),
        check_words(&[7, 1 << 32], 32)
    );
    assert_eq!(Ok(()), check_words(&[u64::MAX], 64));
}

/// Reads one output per line. Blank lines are skipped, `0x` prefixes are
/// read as hex.
pub fn parse_observed(text: &str) -> Result<Vec<u64>, Error> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line, word)| {
            let parsed = match word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None      => word.parse::<u64>(),
            };
            parsed.context(ParseWordSnafu { line })
        })
        .collect()
}

#[test]
fn test_parse_observed() {
    let case = "1\n\n  0x10 \n18446744073709551615\n";
    assert_eq!(Ok(vec![1, 16, u64::MAX]), parse_observed(case));

    let result = parse_observed("12\nnope\n");
    assert!(matches!(result, Err(Error::ParseWord { line: 2, .. })));

    let result = parse_observed("-3");
    assert!(matches!(result, Err(Error::ParseWord { line: 1, .. })));
}
