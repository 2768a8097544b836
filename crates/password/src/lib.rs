//! Password-domain helpers: strength scoring, generation, and the URL host
//! normalization shared by import deduplication and site matching.

pub mod generator;
pub mod strength;
pub mod url;

pub use {
    generator::{GeneratorError, GeneratorOptions, generate},
    strength::{Strength, StrengthBand, evaluate},
    url::{host_from_url, hosts_equal, normalize_host},
};
