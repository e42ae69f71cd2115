use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use snafu::{ensure, OptionExt};

use crate::util::{word_mask, Error, InvalidParametersSnafu, ParameterCountSnafu, UnknownPresetSnafu};

/// Constants of one Mersenne Twister family member.
///
/// `w` word size in bits, `n` degree of recurrence, `m` middle offset, `r`
/// split point of a word, `a` twist matrix coefficients, `(u, d)`, `(s, b)`,
/// `(t, c)` and `l` the tempering shifts and masks, `f` the seeding multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Params {
    pub w: u32,
    pub n: usize,
    pub m: usize,
    pub r: u32,
    pub a: u64,
    pub u: u32,
    pub d: u64,
    pub s: u32,
    pub b: u64,
    pub t: u32,
    pub c: u64,
    pub l: u32,
    pub f: u64,
}

pub const MT19937: Params = Params {
    w: 32, n: 624, m: 397, r: 31,
    a: 0x9908b0df,
    u: 11, d: 0xffffffff,
    s: 7,  b: 0x9d2c5680,
    t: 15, c: 0xefc60000,
    l: 18,
    f: 1812433253,
};

pub const MT19937_64: Params = Params {
    w: 64, n: 312, m: 156, r: 31,
    a: 0xb5026f5aa96619e9,
    u: 29, d: 0x5555555555555555,
    s: 17, b: 0x71d67fffeda60000,
    t: 37, c: 0xfff7eee000000000,
    l: 43,
    f: 6364136223846793005,
};

// boost's mt11213b
pub const MT11213B: Params = Params {
    w: 32, n: 351, m: 175, r: 19,
    a: 0xccab8ee7,
    u: 11, d: 0xffffffff,
    s: 7,  b: 0x31b6ab00,
    t: 15, c: 0xffe50000,
    l: 17,
    f: 1812433253,
};

impl Params {
    /// Builds a parameter set from `[w, n, m, r, a, u, d, s, b, t, c, l, f]`.
    pub fn custom(values: &[u64]) -> Result<Self, Error> {
        ensure!(values.len() == 13, ParameterCountSnafu { got: values.len() });
        let small = |idx: usize, name: &str| -> Result<u32, Error> {
            ensure!(values[idx] <= 64, InvalidParametersSnafu {
                reason: format!("{name} = {} is larger than any word size", values[idx]),
            });
            Ok(values[idx] as u32)
        };
        let index = |idx: usize, name: &str| -> Result<usize, Error> {
            usize::try_from(values[idx]).map_err(|_| Error::InvalidParameters {
                reason: format!("{name} = {} does not fit in memory", values[idx]),
            })
        };
        let params = Params {
            w: small(0, "w")?,
            n: index(1, "n")?,
            m: index(2, "m")?,
            r: small(3, "r")?,
            a: values[4],
            u: small(5, "u")?,
            d: values[6],
            s: small(7, "s")?,
            b: values[8],
            t: small(9, "t")?,
            c: values[10],
            l: small(11, "l")?,
            f: values[12],
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), Error> {
        ensure!((2..=64).contains(&self.w), InvalidParametersSnafu {
            reason: format!("word size w = {} must be within 2..=64", self.w),
        });
        ensure!(self.n >= 2, InvalidParametersSnafu {
            reason: format!("state length n = {} must be at least 2", self.n),
        });
        ensure!(self.m >= 1 && self.m < self.n, InvalidParametersSnafu {
            reason: format!("offset m = {} must be within 1..{}", self.m, self.n),
        });
        ensure!(self.r < self.w, InvalidParametersSnafu {
            reason: format!("split point r = {} must be below w = {}", self.r, self.w),
        });
        for (name, shift) in [("u", self.u), ("s", self.s), ("t", self.t), ("l", self.l)] {
            ensure!(shift >= 1 && shift < self.w, InvalidParametersSnafu {
                reason: format!("shift {name} = {shift} must be within 1..{}", self.w),
            });
        }
        let mask = self.word_mask();
        for (name, value) in [("a", self.a), ("d", self.d), ("b", self.b), ("c", self.c), ("f", self.f)] {
            ensure!(value & !mask == 0, InvalidParametersSnafu {
                reason: format!("constant {name} = {value:#x} does not fit in {} bits", self.w),
            });
        }
        Ok(())
    }

    pub fn word_mask(&self) -> u64 {
        word_mask(self.w)
    }

    pub fn lower_mask(&self) -> u64 {
        (1 << self.r) - 1
    }

    // A single bit, the one the recurrence keeps from the first word
    pub fn upper_mask(&self) -> u64 {
        1 << self.r
    }
}

#[test]
fn test_masks() {
    assert_eq!(MT19937.lower_mask(), 0x7fffffff);
    assert_eq!(MT19937.upper_mask(), 0x80000000);
    assert_eq!(MT11213B.lower_mask(), 0x7ffff);
    assert_eq!(MT11213B.upper_mask(), 0x80000);
    assert_eq!(MT19937_64.word_mask(), u64::MAX);
}

#[test]
fn test_custom_params() {
    let values = [
        32, 624, 397, 31,
        0x9908b0df,
        11, 0xffffffff,
        7, 0x9d2c5680,
        15, 0xefc60000,
        18,
        1812433253,
    ];
    assert_eq!(Ok(MT19937), Params::custom(&values));
    assert_eq!(Err(Error::ParameterCount { got: 12 }), Params::custom(&values[..12]));

    let mut bad_offset = values;
    bad_offset[2] = 624;
    assert!(matches!(Params::custom(&bad_offset), Err(Error::InvalidParameters { .. })));

    let mut wide_mask = values;
    wide_mask[8] = 1 << 40;
    assert!(matches!(Params::custom(&wide_mask), Err(Error::InvalidParameters { .. })));

    let mut zero_shift = values;
    zero_shift[11] = 0;
    assert!(matches!(Params::custom(&zero_shift), Err(Error::InvalidParameters { .. })));
}

/// A named preset, or a custom set of constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Mt19937,
    Mt19937_64,
    Mt11213b,
    Custom(Params),
}

impl Variant {
    pub fn custom(values: &[u64]) -> Result<Self, Error> {
        Params::custom(values).map(Variant::Custom)
    }

    pub fn params(&self) -> Params {
        match self {
            Variant::Mt19937     => MT19937,
            Variant::Mt19937_64  => MT19937_64,
            Variant::Mt11213b    => MT11213B,
            Variant::Custom(p)   => *p,
        }
    }
}

lazy_static! {
    static ref PRESETS: HashMap<&'static str, Variant> = HashMap::from([
        ("mt19937", Variant::Mt19937),
        ("mt19937_64", Variant::Mt19937_64),
        ("mt11213b", Variant::Mt11213b),
    ]);
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Error> {
        PRESETS
            .get(name)
            .copied()
            .context(UnknownPresetSnafu { name })
    }
}

#[test]
fn test_presets_are_valid() {
    for variant in PRESETS.values() {
        assert_eq!(Ok(()), variant.params().validate());
    }
}

#[test]
fn test_variant_from_str() {
    assert_eq!(Ok(Variant::Mt19937), "mt19937".parse());
    assert_eq!(Ok(Variant::Mt19937_64), "mt19937_64".parse());
    assert_eq!(Ok(Variant::Mt11213b), "mt11213b".parse());
    assert_eq!(
        Err(Error::UnknownPreset { name: "mt19937_32".to_string() }),
        "mt19937_32".parse::<Variant>()
    );
    assert_eq!(351, Variant::Mt11213b.params().n);
}
