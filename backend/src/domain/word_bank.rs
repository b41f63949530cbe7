//! Word bank backing the verbal-memory test.

use rand::Rng;
use rand::seq::SliceRandom;

/// Default number of words handed to the client per round.
pub const DEFAULT_WORD_COUNT: usize = 10;

/// Words shown during the verbal-memory test.
const WORDS: [&str; 50] = [
    "apple", "banana", "cherry", "dog", "elephant", "forest", "garden", "house", "island",
    "jungle", "kitten", "lion", "mountain", "ocean", "planet", "queen", "river", "sunset",
    "tiger", "umbrella", "valley", "water", "xylophone", "yellow", "zebra", "adventure",
    "beautiful", "courage", "diamond", "energy", "freedom", "guitar", "happiness", "imagine",
    "journey", "kindness", "library", "miracle", "nature", "oasis", "peaceful", "quality",
    "rainbow", "sunshine", "treasure", "universe", "victory", "wonder", "xenial", "youthful",
];

/// Draw `count` distinct words in shuffled order.
///
/// Generic over the RNG so tests can pass a seeded generator; requests for
/// more words than the bank holds return the whole bank.
pub fn sample_words<R: Rng>(count: usize, rng: &mut R) -> Vec<&'static str> {
    let mut words = WORDS.to_vec();
    words.shuffle(rng);
    words.truncate(count.min(WORDS.len()));
    words
}
