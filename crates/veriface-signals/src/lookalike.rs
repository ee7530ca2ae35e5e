//! Celebrity-lookalike novelty feature.
//!
//! A real implementation would search a celebrity gallery with the same
//! descriptor machinery the matcher uses. This one is explicitly
//! randomized behind the same interface so it can be swapped later without
//! touching the orchestrator.

use crate::LookalikeFinder;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::path::Path;

const CELEBRITIES: &[&str] = &[
    "Elon Musk",
    "Brad Pitt",
    "Angelina Jolie",
    "Robert Downey Jr.",
    "Scarlett Johansson",
    "The Rock",
];

/// Picks a random name from a fixed celebrity list.
pub struct RandomLookalike;

#[async_trait]
impl LookalikeFinder for RandomLookalike {
    async fn find_lookalike(&self, _image_path: &Path) -> String {
        let name = CELEBRITIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Elon Musk");
        name.to_string()
    }
}
