#[cfg(test)]
use rand::Rng;

use crate::params::Params;
use crate::util::word_mask;

// Undoes y = x ^ ((x >> shift) & mask).
// The top `shift` bits of y are those of x. Each recovered block of x is
// then shifted down and XORed back into the next block, top to bottom.
pub fn invert_right(value: u64, shift: u32, mask: u64, w: u32) -> u64 {
    let full = word_mask(w);
    let mut block = (full << (w - shift)) & full;
    let mut x = value & full;
    while block != 0 {
        x ^= ((x & block) >> shift) & mask;
        block >>= shift;
    }
    x
}

#[test]
fn test_invert_right() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let x: u64 = rng.gen::<u32>() as u64;
        let y = x ^ ((x >> 11) & 0xffffffff);
        assert_eq!(x, invert_right(y, 11, 0xffffffff, 32));
        let y = x ^ (x >> 18);
        assert_eq!(x, invert_right(y, 18, 0xffffffff, 32));
    }
    let x = u64::MAX;
    let y = x ^ ((x >> 29) & 0x5555555555555555);
    assert_eq!(x, invert_right(y, 29, 0x5555555555555555, 64));
}

// Undoes y = x ^ ((x << shift) & mask), bottom to top.
pub fn invert_left(value: u64, shift: u32, mask: u64, w: u32) -> u64 {
    let full = word_mask(w);
    let mut block = (1u64 << shift) - 1;
    let mut x = value & full;
    while block != 0 {
        x ^= ((x & block) << shift) & mask;
        block = (block << shift) & full;
    }
    x & full
}

#[test]
fn test_invert_left() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let x: u64 = rng.gen::<u32>() as u64;
        let y = (x ^ ((x << 7) & 0x9d2c5680)) & 0xffffffff;
        assert_eq!(x, invert_left(y, 7, 0x9d2c5680, 32));
        let y = (x ^ ((x << 15) & 0xefc60000)) & 0xffffffff;
        assert_eq!(x, invert_left(y, 15, 0xefc60000, 32));

        let x: u64 = rng.gen();
        let y = x ^ ((x << 37) & 0xfff7eee000000000);
        assert_eq!(x, invert_left(y, 37, 0xfff7eee000000000, 64));
    }
}

/// Recovers the raw state word behind one tempered output.
pub fn untemper(params: &Params, output: u64) -> u64 {
    let w = params.w;
    let mut y = invert_right(output, params.l, params.word_mask(), w);
    y = invert_left(y, params.t, params.c, w);
    y = invert_left(y, params.s, params.b, w);
    invert_right(y, params.u, params.d, w)
}

#[test]
fn test_untemper_boundaries() {
    use crate::params::{MT11213B, MT19937, MT19937_64};
    use crate::rng::temper;

    for params in [MT19937, MT19937_64, MT11213B] {
        let top = params.word_mask();
        assert_eq!(0, untemper(&params, temper(&params, 0)));
        assert_eq!(top, untemper(&params, temper(&params, top)));
        assert_eq!(1, untemper(&params, temper(&params, 1)));
    }
}
