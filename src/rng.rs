use std::num::Wrapping;

use log::debug;
use rand::RngCore;
use snafu::ensure;

use crate::params::{Params, MT11213B, MT19937, MT19937_64};
use crate::util::{check_words, Error, StateIndexSnafu, StateLengthSnafu};

/// Everything needed to resume a generator: the `n` words and the number of
/// them already tempered and handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub mt: Vec<u64>,
    pub idx: usize,
}

pub struct MTRng {
    params: Params,
    mt: Vec<u64>,
    idx: usize,
}

impl MTRng {
    pub fn build_seeded(params: Params, seed: u64) -> Self {
        let mut rng = Self {
            params: params,
            mt: vec![0u64; params.n],
            idx: params.n,
        };
        rng.seed(seed);
        rng
    }

    pub fn from_state(params: Params, state: State) -> Result<Self, Error> {
        let mut rng = Self {
            params: params,
            mt: vec![0u64; params.n],
            idx: params.n,
        };
        rng.set_state(state)?;
        Ok(rng)
    }

    /// Expands `seed` into a full state. The first draw afterwards twists.
    pub fn seed(&mut self, seed: u64) {
        let Params { w, n, f, .. } = self.params;
        let lowest_w_bitmask = self.params.word_mask();
        self.mt[0] = seed & lowest_w_bitmask;
        for i in 1..n {
            let prev = self.mt[i-1];
            self.mt[i] = lowest_w_bitmask & (Wrapping(f) * Wrapping(prev ^ (prev >> (w-2))) + Wrapping(i as u64)).0;
        }
        self.idx = n;
    }

    pub fn next(&mut self) -> u64 {
        if self.idx >= self.params.n {
            self.twist();
        }
        let y = temper(&self.params, self.mt[self.idx]);
        self.idx = self.idx + 1;
        y
    }

    // Words are replaced one at a time, so from i = n-m onwards the middle
    // word is already a new one, as is mt[0] when i = n-1.
    pub fn twist(&mut self) {
        let n = self.params.n;
        let m = self.params.m;
        for i in 0..n {
            self.mt[i] = twist_word(&self.params, self.mt[i], self.mt[(i+1) % n], self.mt[(i+m) % n]);
        }
        self.idx = 0;
    }

    pub fn state(&self) -> State {
        State {
            mt: self.mt.clone(),
            idx: self.idx,
        }
    }

    pub fn set_state(&mut self, state: State) -> Result<(), Error> {
        let n = self.params.n;
        ensure!(state.mt.len() == n, StateLengthSnafu { expected: n, got: state.mt.len() });
        ensure!(state.idx <= n, StateIndexSnafu { index: state.idx, n });
        check_words(&state.mt, self.params.w)?;
        debug!("loading state with {} words at index {}", n, state.idx);
        self.mt = state.mt;
        self.idx = state.idx;
        Ok(())
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// The output transform applied to a raw state word.
pub fn temper(params: &Params, x: u64) -> u64 {
    let mut y = x;
    y = y ^ ((y >> params.u) & params.d);
    y = y ^ ((y << params.s) & params.b);
    y = y ^ ((y << params.t) & params.c);
    y = y ^ (y >> params.l);
    y & params.word_mask()
}

/// One step of the recurrence, `x[k+n]` from `x[k]`, `x[k+1]` and `x[k+m]`.
pub(crate) fn twist_word(params: &Params, first: u64, second: u64, middle: u64) -> u64 {
    let x = (first & params.upper_mask()) | (second & params.lower_mask());
    let mut x_a = x >> 1;
    if (x % 2) != 0 {
        x_a = x_a ^ params.a;
    }
    (middle ^ x_a) & params.word_mask()
}

impl RngCore for MTRng {
    fn next_u32(&mut self) -> u32 {
        self.next() as u32
    }

    fn next_u64(&mut self) -> u64 {
        if self.params.w > 32 {
            self.next()
        } else {
            let lo = self.next() & 0xffff_ffff;
            let hi = self.next() & 0xffff_ffff;
            (hi << 32) | lo
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

pub fn get_mt19937(seed: u64) -> MTRng {
    MTRng::build_seeded(MT19937, seed)
}

pub fn get_mt19937_64(seed: u64) -> MTRng {
    MTRng::build_seeded(MT19937_64, seed)
}

pub fn get_mt11213b(seed: u64) -> MTRng {
    MTRng::build_seeded(MT11213B, seed)
}

#[test]
fn test_seeding() {
    let rng = get_mt19937(0);
    assert_eq!(&rng.state().mt[0..5], &[0, 1, 1812433255, 1900727105, 1208447044]);
    assert_eq!(rng.state().idx, 624);

    let rng = get_mt19937_64(2);
    assert_eq!(&rng.state().mt[0..3], &[2, 12728272447693586011, 8677659224773876903]);
}

#[test]
fn test_mt19937_32() {
    let mut rng = get_mt19937(5489);
    assert_eq!(rng.next(), 3499211612);
    let last = (1..10000).map(|_| rng.next()).last();
    assert_eq!(last, Some(4123659995));

    let mut rng = get_mt19937(1);
    let outputs: Vec<u64> = (0..10).map(|_| rng.next()).collect();
    assert_eq!(outputs, vec![
        1791095845, 4282876139, 3093770124, 4005303368, 491263,
        550290313, 1298508491, 4290846341, 630311759, 1013994432,
    ]);

    let mut rng = get_mt19937(17);
    let outputs: Vec<u64> = (0..3).map(|_| rng.next()).collect();
    assert_eq!(outputs, vec![1265576559, 780729585, 2278852751]);
}

#[test]
fn test_mt19937_64() {
    let mut rng = get_mt19937_64(5489);
    assert_eq!(rng.next(), 14514284786278117030);
    let last = (1..10000).map(|_| rng.next()).last();
    assert_eq!(last, Some(6073363188424876624));

    let mut rng = get_mt19937_64(99);
    let outputs: Vec<u64> = (0..3).map(|_| rng.next()).collect();
    assert_eq!(outputs, vec![8015931446409328671, 420201814257642640, 3557127180441367622]);
}

#[test]
fn test_mt11213b() {
    let mut rng = get_mt11213b(5489);
    let outputs: Vec<u64> = (0..5).map(|_| rng.next()).collect();
    assert_eq!(outputs, vec![4013899583, 1516268865, 4116451104, 1916991252, 3679509292]);
}

#[test]
fn test_seed_is_truncated_to_word() {
    let mut wide = get_mt19937((1 << 40) | 5489);
    let mut narrow = get_mt19937(5489);
    for _ in 0..100 {
        assert_eq!(wide.next(), narrow.next());
    }
}

#[test]
fn test_get_and_set_state() {
    let mut rng = get_mt11213b(123);
    for _ in 0..500 {
        rng.next();
    }
    let saved = rng.state();
    let original: Vec<u64> = (0..1000).map(|_| rng.next()).collect();
    rng.set_state(saved.clone()).unwrap();
    let restored: Vec<u64> = (0..1000).map(|_| rng.next()).collect();
    assert_eq!(original, restored);

    let mut fresh = MTRng::from_state(MT11213B, saved).unwrap();
    assert_eq!(fresh.next(), original[0]);
}

#[test]
fn test_set_state_rejects_bad_records() {
    let mut rng = get_mt19937(1);
    let short = State { mt: vec![0; 10], idx: 0 };
    assert_eq!(Err(Error::StateLength { expected: 624, got: 10 }), rng.set_state(short));

    let past_end = State { mt: vec![0; 624], idx: 625 };
    assert_eq!(Err(Error::StateIndex { index: 625, n: 624 }), rng.set_state(past_end));

    let mut wide = vec![0; 624];
    wide[3] = 1 << 32;
    let wide = State { mt: wide, idx: 0 };
    assert_eq!(
        Err(Error::WordOutOfRange { index: 3, value: 1 << 32, w: 32 }),
        rng.set_state(wide)
    );
}

#[test]
fn test_rng_core() {
    let mut a = get_mt19937(42);
    let mut b = get_mt19937(42);
    let lo = b.next();
    let hi = b.next();
    assert_eq!(a.next_u64(), (hi << 32) | lo);

    let mut c = get_mt19937_64(42);
    let mut d = get_mt19937_64(42);
    let mut buf = [0u8; 12];
    c.fill_bytes(&mut buf);
    let first = d.next().to_le_bytes();
    let second = d.next().to_le_bytes();
    assert_eq!(&buf[..8], &first);
    assert_eq!(&buf[8..], &second[..4]);
}
