use rand::{seq::SliceRandom, Rng};

/// Uniform choice over a fixed template list. Empty lists yield "".
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, candidates: &[&'a str]) -> &'a str {
    candidates.choose(rng).copied().unwrap_or_default()
}
