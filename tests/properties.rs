//! Property-based tests for the tempering and twist inversions.

use proptest::prelude::*;
use mtcrack::{temper, untemper::untemper, MTCracker, MTRng, State, Variant, MT11213B, MT19937, MT19937_64};

proptest! {
    /// untemper(temper(x)) = x for every 32-bit word
    #[test]
    fn prop_untemper_mt19937(x: u32) {
        let x = x as u64;
        prop_assert_eq!(untemper(&MT19937, temper(&MT19937, x)), x);
    }

    #[test]
    fn prop_untemper_mt11213b(x: u32) {
        let x = x as u64;
        prop_assert_eq!(untemper(&MT11213B, temper(&MT11213B, x)), x);
    }

    #[test]
    fn prop_untemper_mt19937_64(x: u64) {
        prop_assert_eq!(untemper(&MT19937_64, temper(&MT19937_64, x)), x);
    }

    /// temper(untemper(y)) = y, the other direction of the bijection
    #[test]
    fn prop_temper_untemper_mt19937_64(y: u64) {
        prop_assert_eq!(temper(&MT19937_64, untemper(&MT19937_64, y)), y);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// untwist(twist(s)) = s on every word but the first
    #[test]
    fn prop_untwist_inverts_twist(seed: u32) {
        let mut rng = MTRng::build_seeded(MT19937, seed as u64);
        let before = rng.state().mt;
        rng.twist();
        let cracker = MTCracker::new(Variant::Mt19937);
        let recovered = cracker.untwist(&rng.state().mt).unwrap();
        prop_assert_eq!(&before[1..], &recovered[1..]);
    }

    /// twist(untwist(s)) = s for every preset
    #[test]
    fn prop_twist_after_untwist(seed in any::<u64>(), preset in prop_oneof![
        Just(Variant::Mt19937),
        Just(Variant::Mt19937_64),
        Just(Variant::Mt11213b),
    ]) {
        let params = preset.params();
        let mut rng = MTRng::build_seeded(params, seed);
        rng.twist();
        let twisted = rng.state().mt;
        let recovered = MTCracker::new(preset).untwist(&twisted).unwrap();
        let mut replay = MTRng::from_state(params, State { mt: recovered, idx: 0 }).unwrap();
        replay.twist();
        prop_assert_eq!(twisted, replay.state().mt);
    }
}
