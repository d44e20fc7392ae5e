//! Fiction-prefix inclusion filter
//!
//! Books whose genres mark them as fiction are always kept. Everything else
//! is kept with probability `1 - discard_probability`, using one draw from a
//! [`RandomSource`] per entry.

use crate::random::RandomSource;

/// Genre prefixes treated as fiction when no list is configured.
pub const DEFAULT_FICTION_PREFIXES: &[&str] = &[
    "sf",
    "popadancy",
    "litrpg",
    "russian_fantasy",
    "popadanec",
    "modern_tale",
    "hronoopera",
    "child_sf",
    "love_sf",
];

/// Probability of dropping a non-fiction book.
pub const DEFAULT_DISCARD_PROBABILITY: f64 = 0.75;

/// Normalized set of genre prefixes: trimmed, non-empty, no repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenrePrefixSet {
    prefixes: Vec<String>,
}

impl GenrePrefixSet {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Vec::<String>::new();
        for prefix in prefixes {
            let prefix = prefix.as_ref().trim();
            if !prefix.is_empty() && !set.iter().any(|p| p == prefix) {
                set.push(prefix.to_string());
            }
        }
        Self { prefixes: set }
    }

    /// Whether `genre` starts with any prefix (case-sensitive).
    #[must_use]
    pub fn matches(&self, genre: &str) -> bool {
        self.prefixes.iter().any(|p| genre.starts_with(p.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }
}

impl Default for GenrePrefixSet {
    fn default() -> Self {
        Self::new(DEFAULT_FICTION_PREFIXES)
    }
}

impl<S: AsRef<str>> FromIterator<S> for GenrePrefixSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Outcome of the inclusion policy for one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Discard,
}

#[derive(Debug, Clone)]
pub struct InclusionFilter {
    fiction: GenrePrefixSet,
    discard_probability: f64,
}

impl InclusionFilter {
    #[must_use]
    pub fn new(fiction: GenrePrefixSet, discard_probability: f64) -> Self {
        Self {
            fiction,
            discard_probability,
        }
    }

    #[must_use]
    pub fn is_fiction(&self, genres: &[String]) -> bool {
        genres.iter().any(|g| self.fiction.matches(g))
    }

    /// Decide whether to keep the book identified by `entry_id`.
    ///
    /// Fiction never consumes a draw.
    pub fn decide(&self, entry_id: &str, genres: &[String], random: &dyn RandomSource) -> Decision {
        if self.is_fiction(genres) {
            return Decision::Keep;
        }
        if random.sample(entry_id) < self.discard_probability {
            Decision::Discard
        } else {
            Decision::Keep
        }
    }
}

impl Default for InclusionFilter {
    fn default() -> Self {
        Self::new(GenrePrefixSet::default(), DEFAULT_DISCARD_PROBABILITY)
    }
}
