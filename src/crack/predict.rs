use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, trace};
use snafu::ensure;

use crate::crack::untemper::untemper;
use crate::params::Params;
use crate::rng::{temper, twist_word};
use crate::util::{check_words, Error, ObservedTooShortSnafu};

/// A guess at where a twist happened, in observed-sequence positions, and
/// how many outputs in a row it explains counting back from the newest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub score: usize,
}

// x[k+n] only depends on x[k], x[k+1] and x[k+m]. Under the hypothesis that
// `twist_index` starts a block, a source word before `twist_index` is read
// from the block [twist_index - n, twist_index), wrapping around inside it.
// One at or past `twist_index` was already replaced when the twist reached
// it, so it is read at its own stream position.
//
// Returns None when a source word lies past the end of `raw`. That is not a
// mismatch, the hypothesis simply says nothing about this position.
pub fn predict_from(params: &Params, raw: &[u64], twist_index: usize) -> Option<u64> {
    let n = params.n;
    let len = raw.len();
    if len < n || twist_index < n {
        return None;
    }
    let k = len - n;
    let base = twist_index - n;
    let source = |offset: usize| {
        if k + offset >= twist_index {
            return k + offset;
        }
        let rel = (k + offset) as isize - twist_index as isize;
        rel.rem_euclid(n as isize) as usize + base
    };
    let next = source(1);
    let middle = source(params.m);
    if next >= len || middle >= len {
        return None;
    }
    let x = twist_word(params, raw[k], raw[next], raw[middle]);
    Some(temper(params, x))
}

// Walks back from the newest output; the first miss or gap ends the run.
fn score_candidate(params: &Params, observed: &[u64], raw: &[u64], twist_index: usize) -> usize {
    let len = observed.len();
    (0..len - params.n - 1)
        .map(|back| len - 1 - back)
        .take_while(|&target| predict_from(params, &raw[..target], twist_index) == Some(observed[target]))
        .count()
}

fn search(params: &Params, observed: &[u64]) -> Result<(Vec<u64>, Vec<Candidate>), Error> {
    ensure!(observed.len() > params.n, ObservedTooShortSnafu {
        needed: params.n + 1,
        got: observed.len(),
    });
    check_words(observed, params.w)?;

    let raw: Vec<u64> = observed
        .iter()
        .map(|&y| untemper(params, y))
        .collect();
    let candidates: Vec<Candidate> = (params.n..observed.len())
        .map(|index| {
            let score = score_candidate(params, observed, &raw, index);
            trace!("twist index {} explains {} outputs", index, score);
            Candidate { index, score }
        })
        .collect();
    Ok((raw, candidates))
}

/// Scores every twist index in `n..observed.len()`.
pub fn score_candidates(params: &Params, observed: &[u64]) -> Result<Vec<Candidate>, Error> {
    search(params, observed).map(|(_, candidates)| candidates)
}

// All indices sharing the best nonzero score. No score at all means no
// alignment could be found, and the result is empty.
fn best_indices(candidates: &[Candidate]) -> Vec<usize> {
    let best = candidates
        .iter()
        .map(|c| c.score)
        .max()
        .unwrap_or(0);
    if best == 0 {
        debug!("no twist index explains the newest output");
        return Vec::new();
    }
    let indices = candidates
        .iter()
        .filter(|c| c.score == best)
        .map(|c| c.index)
        .collect_vec();
    debug!("twist indices [{}] explain {} outputs", indices.iter().join(", "), best);
    indices
}

pub fn closest_twist_indices(params: &Params, observed: &[u64]) -> Result<Vec<usize>, Error> {
    let candidates = score_candidates(params, observed)?;
    Ok(best_indices(&candidates))
}

/// Predicts the output following `observed`, one value per best-scoring
/// twist index.
pub fn predict_next(params: &Params, observed: &[u64]) -> Result<HashSet<u64>, Error> {
    let (raw, candidates) = search(params, observed)?;
    Ok(best_indices(&candidates)
        .into_iter()
        .filter_map(|index| predict_from(params, &raw, index))
        .collect())
}
