use snafu::ensure;

use crate::params::Params;
use crate::util::{check_words, Error, IrreversibleTwistSnafu, StateLengthSnafu};

/// Rebuilds the state array that a single twist turned into `state`.
///
/// Walks the recurrence backwards from the last word. Bit `r` of
/// `state[i] ^ x[i+m]` says whether `a` was folded in, which gives back the
/// word fed through the twist matrix: bit `r` of the old `state[i]` and the
/// low `r` bits of the old `state[i+1]`. Old words `m..n` also come back in
/// full as `x[i+m]`.
///
/// Old word 0 only ever contributes bit `r`, so its other bits come back as
/// zero, and so do the bits above `r` of old words `1..m`, which the twist
/// discards. Twisting the result always gives `state` back.
pub fn untwist(params: &Params, state: &[u64]) -> Result<Vec<u64>, Error> {
    let Params { n, m, a, .. } = *params;
    ensure!(state.len() == n, StateLengthSnafu { expected: n, got: state.len() });
    check_words(state, params.w)?;
    ensure!(a & params.upper_mask() != 0, IrreversibleTwistSnafu {
        reason: "twist constant has bit r clear, odd words cannot be told apart",
    });
    ensure!(m > 1, IrreversibleTwistSnafu {
        reason: "offset m = 1 ties each word to its own successor",
    });

    let upper = params.upper_mask();
    let lower = params.lower_mask();
    let mut prev = vec![0u64; n];
    for i in (0..n).rev() {
        let middle = if i + m >= n { state[i + m - n] } else { prev[i + m] };
        let folded = (state[i] ^ middle) & (upper | lower);
        let odd = folded & upper != 0;
        let halved = (if odd { folded ^ a } else { folded }) & lower;
        let x = (halved << 1) | (odd as u64);

        prev[i] = (prev[i] & !upper) | (x & upper);
        if i + 1 < n {
            prev[i+1] = (prev[i+1] & !lower) | (x & lower);
        }
        if i + m < n {
            let mut x_a = x >> 1;
            if odd {
                x_a ^= a;
            }
            prev[i+m] = (state[i] ^ x_a) & params.word_mask();
        }
    }
    Ok(prev)
}
