use std::collections::HashSet;

use log::debug;
use snafu::ensure;

use crate::params::{Params, Variant};
use crate::rng::{MTRng, State};
use crate::util::{check_words, Error, ObservedTooShortSnafu};

pub mod untemper;
pub mod untwist;
pub mod predict;

pub use predict::Candidate;

/// Recovers generator state from tempered outputs.
///
/// Two situations are covered:
/// 1. `n` consecutive outputs starting right after a twist: `crack_state`
///    gives back the exact state.
/// 2. More than `n` consecutive outputs with the twist position unknown:
///    `predict_next_state` guesses the position and predicts what comes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MTCracker {
    params: Params,
}

impl MTCracker {
    pub fn new(variant: Variant) -> Self {
        Self { params: variant.params() }
    }

    pub fn from_preset(name: &str) -> Result<Self, Error> {
        name.parse().map(Self::new)
    }

    pub fn from_custom(values: &[u64]) -> Result<Self, Error> {
        Variant::custom(values).map(Self::new)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    // Only the first n outputs are read
    pub fn crack_state(&self, outputs: &[u64]) -> Result<State, Error> {
        let n = self.params.n;
        ensure!(outputs.len() >= n, ObservedTooShortSnafu { needed: n, got: outputs.len() });
        check_words(outputs, self.params.w)?;
        let mt = self.untemper(&outputs[..n])?;
        debug!("cracked {}-word state from {} outputs", n, outputs.len());
        Ok(State { mt, idx: 0 })
    }

    /// A fresh generator replaying the stream from the first cracked output.
    pub fn clone_rng(&self, outputs: &[u64]) -> Result<MTRng, Error> {
        let state = self.crack_state(outputs)?;
        MTRng::from_state(self.params, state)
    }

    pub fn untemper(&self, outputs: &[u64]) -> Result<Vec<u64>, Error> {
        check_words(outputs, self.params.w)?;
        Ok(outputs
            .iter()
            .map(|&y| untemper::untemper(&self.params, y))
            .collect())
    }

    pub fn untwist(&self, state: &[u64]) -> Result<Vec<u64>, Error> {
        debug!("untwisting {}-word state", state.len());
        untwist::untwist(&self.params, state)
    }

    pub fn score_candidates(&self, observed: &[u64]) -> Result<Vec<Candidate>, Error> {
        predict::score_candidates(&self.params, observed)
    }

    pub fn closest_twist_indices(&self, observed: &[u64]) -> Result<Vec<usize>, Error> {
        predict::closest_twist_indices(&self.params, observed)
    }

    pub fn predict_next_state(&self, observed: &[u64]) -> Result<HashSet<u64>, Error> {
        predict::predict_next(&self.params, observed)
    }
}

#[cfg(test)]
mod generic_tests {
    use crate::crack::*;
    use crate::params::MT19937;
    use crate::rng::{get_mt11213b, get_mt19937, get_mt19937_64};
    use crate::util::parse_observed;
    use rand::Rng;

    fn assert_cracks(mut original: MTRng, variant: Variant) {
        let n = original.params().n;
        let observed: Vec<u64> = (0..n).map(|_| original.next()).collect();
        let cracker = MTCracker::new(variant);
        let state = cracker.crack_state(&observed).unwrap();
        assert_eq!(0, state.idx);

        let mut cloned = MTRng::from_state(*cracker.params(), state).unwrap();
        let replayed: Vec<u64> = (0..n).map(|_| cloned.next()).collect();
        assert_eq!(observed, replayed);
        for _ in 0..10_000 {
            assert_eq!(original.next(), cloned.next());
        }
    }

    #[test]
    fn test_crack_mt19937() {
        let seed: u32 = rand::thread_rng().gen();
        assert_cracks(get_mt19937(seed as u64), Variant::Mt19937);
    }

    #[test]
    fn test_crack_mt19937_64() {
        let seed: u64 = rand::thread_rng().gen();
        assert_cracks(get_mt19937_64(seed), Variant::Mt19937_64);
    }

    #[test]
    fn test_crack_mt11213b() {
        let seed: u32 = rand::thread_rng().gen();
        assert_cracks(get_mt11213b(seed as u64), Variant::Mt11213b);
    }

    #[test]
    fn test_crack_uses_first_n_outputs() {
        let mut original = get_mt19937(99);
        let observed: Vec<u64> = (0..1000).map(|_| original.next()).collect();
        let cracker = MTCracker::from_preset("mt19937").unwrap();
        let mut cloned = cracker.clone_rng(&observed).unwrap();
        let replayed: Vec<u64> = (0..1000).map(|_| cloned.next()).collect();
        assert_eq!(observed, replayed);
    }

    #[test]
    fn test_crack_custom_preset() {
        let values = [
            32, 624, 397, 31,
            0x9908b0df,
            11, 0xffffffff,
            7, 0x9d2c5680,
            15, 0xefc60000,
            18,
            1812433253,
        ];
        let cracker = MTCracker::from_custom(&values).unwrap();
        assert_eq!(&MT19937, cracker.params());
        assert_cracks(get_mt19937(5489), Variant::custom(&values).unwrap());
    }

    #[test]
    fn test_crack_preconditions() {
        let cracker = MTCracker::new(Variant::Mt11213b);
        assert_eq!(
            Err(Error::ObservedTooShort { needed: 351, got: 350 }),
            cracker.crack_state(&vec![0; 350])
        );
        let mut wide = vec![0; 351];
        wide[0] = u64::MAX;
        assert!(matches!(cracker.crack_state(&wide), Err(Error::WordOutOfRange { index: 0, .. })));
        // words past the first n are checked too
        let mut tail = vec![0; 352];
        tail[351] = 1 << 40;
        assert_eq!(
            Err(Error::WordOutOfRange { index: 351, value: 1 << 40, w: 32 }),
            cracker.crack_state(&tail)
        );
        assert_eq!(
            Err(Error::UnknownPreset { name: "mt".to_string() }),
            MTCracker::from_preset("mt")
        );
        assert_eq!(Err(Error::ParameterCount { got: 3 }), MTCracker::from_custom(&[1, 2, 3]));
    }

    #[test]
    fn test_untwist_cracked_state() {
        // crack the second block, then step back to the first
        let mut original = get_mt19937(1234);
        let first: Vec<u64> = (0..624).map(|_| original.next()).collect();
        let second: Vec<u64> = (0..624).map(|_| original.next()).collect();
        let cracker = MTCracker::new(Variant::Mt19937);
        let state = cracker.crack_state(&second).unwrap();
        let earlier = cracker.untwist(&state.mt).unwrap();
        let expected = cracker.untemper(&first).unwrap();
        assert_eq!(&expected[1..], &earlier[1..]);
    }

    #[test]
    fn test_predict_next_from_file() {
        let contents = std::fs::read_to_string("./data/mt19937_64_observed.txt")
            .expect("Should have been able to read the file");
        let observed = parse_observed(&contents).unwrap();
        assert_eq!(412, observed.len());
        let cracker = MTCracker::from_preset("mt19937_64").unwrap();
        let predictions = cracker.predict_next_state(&observed).unwrap();
        assert_eq!(HashSet::from([11789798388146574970]), predictions);
    }

    #[test]
    fn test_predict_next_from_long_file() {
        let contents = std::fs::read_to_string("./data/mt19937_64_520.txt")
            .expect("Should have been able to read the file");
        let observed = parse_observed(&contents).unwrap();
        assert_eq!(520, observed.len());
        let cracker = MTCracker::from_preset("mt19937_64").unwrap();
        let predictions = cracker.predict_next_state(&observed).unwrap();
        assert_eq!(HashSet::from([3596604409767583083]), predictions);
    }

    #[test]
    fn test_predict_with_other_parameters() {
        // outputs of mt19937 read as if they came from mt11213b
        let mut original = get_mt19937(77);
        let observed: Vec<u64> = (0..451).map(|_| original.next()).collect();
        let truth = original.next();
        let cracker = MTCracker::new(Variant::Mt11213b);
        assert!(!cracker.predict_next_state(&observed).unwrap().contains(&truth));
    }
}
