//! Keyword taxonomy of pet-related classifier labels
//!
//! Matching is case-insensitive substring search over the whole label.
//! There is no word-boundary check, so `"catamaran"` matches `"cat"` and
//! `"hotdog, hot dog, red hot"` matches `"dog"`; this is a known source of
//! false positives and is kept as-is. Keywords whose main ImageNet hits are
//! not pets (`"mouse"` for the computer mouse, `"hen"`, `"rat"`) are left out.

use aho_corasick::AhoCorasick;
use pawtrack_core::{Error, Result};

/// Lowercase label fragments that identify an animal a person might own
pub const PET_KEYWORDS: &[&str] = &[
    // dogs
    "dog", "puppy", "retriever", "terrier", "spaniel", "shepherd", "hound", "poodle",
    "bulldog", "beagle", "labrador", "collie", "husky", "corgi", "chihuahua", "pug",
    "dachshund", "rottweiler", "doberman", "boxer", "mastiff", "schnauzer", "pomeranian",
    "setter", "pointer", "malamute", "samoyed", "shih-tzu", "maltese", "pekinese",
    "papillon", "great dane", "dalmatian", "basenji", "whippet", "greyhound", "pinscher",
    // cats
    "cat", "kitten", "tabby", "persian", "siamese", "egyptian",
    // birds
    "bird", "parrot", "macaw", "cockatoo", "lorikeet", "budgie", "parakeet", "finch",
    "canary", "cockatiel", "lovebird", "african grey",
    // small mammals
    "hamster", "guinea pig", "rabbit", "bunny", "hare", "ferret", "chinchilla",
    "gerbil", "hedgehog",
    // reptiles
    "turtle", "tortoise", "lizard", "gecko", "iguana", "snake", "python",
    "chameleon", "terrapin",
    // horses and fish
    "horse", "pony", "sorrel", "goldfish", "koi", "fish",
];

/// Compiled, read-only keyword matcher
#[derive(Debug, Clone)]
pub struct PetTaxonomy {
    matcher: AhoCorasick,
}

impl PetTaxonomy {
    /// Build a taxonomy from arbitrary keywords
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(keywords)
            .map_err(|e| Error::config(format!("Failed to build pet keyword matcher: {}", e)))?;

        Ok(Self { matcher })
    }

    /// Whether `label` contains any keyword
    pub fn matches(&self, label: &str) -> bool {
        self.matcher.is_match(label)
    }

    /// Number of keywords compiled in
    pub fn len(&self) -> usize {
        self.matcher.patterns_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PetTaxonomy {
    fn default() -> Self {
        Self::new(PET_KEYWORDS).expect("built-in pet keywords must compile")
    }
}
