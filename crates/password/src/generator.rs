//! Random password generation from selectable character classes.

use rand::{Rng, seq::SliceRandom};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.?/\\|~";

/// Characters easily confused in print: `O0oIl1`.
const AMBIGUOUS: &str = "O0oIl1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub use_upper: bool,
    pub use_lower: bool,
    pub use_digits: bool,
    pub use_symbols: bool,
    pub exclude_ambiguous: bool,
    /// Guarantee at least one character from every selected class.
    pub require_each_selected_type: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            use_upper: true,
            use_lower: true,
            use_digits: true,
            use_symbols: true,
            exclude_ambiguous: false,
            require_each_selected_type: true,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("length must be at least 1")]
    InvalidLength,

    #[error("at least one character class must be selected")]
    NoClassSelected,

    #[error("length must cover all {selected} selected character classes")]
    LengthTooShort { selected: usize },
}

fn filter_ambiguous(chars: &str, exclude: bool) -> Vec<char> {
    chars
        .chars()
        .filter(|c| !exclude || !AMBIGUOUS.contains(*c))
        .collect()
}

/// Generate a password honoring the selected classes.
pub fn generate(options: &GeneratorOptions) -> Result<String, GeneratorError> {
    if options.length == 0 {
        return Err(GeneratorError::InvalidLength);
    }

    let mut pools: Vec<Vec<char>> = Vec::with_capacity(4);
    if options.use_upper {
        pools.push(filter_ambiguous(UPPER, options.exclude_ambiguous));
    }
    if options.use_lower {
        pools.push(filter_ambiguous(LOWER, options.exclude_ambiguous));
    }
    if options.use_digits {
        pools.push(filter_ambiguous(DIGITS, options.exclude_ambiguous));
    }
    if options.use_symbols {
        pools.push(filter_ambiguous(SYMBOLS, options.exclude_ambiguous));
    }
    pools.retain(|pool| !pool.is_empty());

    if pools.is_empty() {
        return Err(GeneratorError::NoClassSelected);
    }
    if options.require_each_selected_type && options.length < pools.len() {
        return Err(GeneratorError::LengthTooShort {
            selected: pools.len(),
        });
    }

    let all: Vec<char> = pools.iter().flatten().copied().collect();

    let mut rng = rand::rng();
    let mut out: Vec<char> = Vec::with_capacity(options.length);

    if options.require_each_selected_type {
        for pool in &pools {
            out.push(pool[rng.random_range(0..pool.len())]);
        }
    }
    while out.len() < options.length {
        out.push(all[rng.random_range(0..all.len())]);
    }

    out.shuffle(&mut rng);
    Ok(out.into_iter().collect())
}
