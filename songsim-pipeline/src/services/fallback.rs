//! Fallback value generation
//!
//! Numeric fallbacks are drawn from a PRNG seeded per source file from the
//! run's imputation seed and the file's path relative to the scan root. The
//! same file under the same seed always receives the same fallback values,
//! independent of which other files were scanned.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Fallback tempo range (BPM)
pub const TEMPO_RANGE: (f64, f64) = (60.0, 180.0);
/// Fallback release year range, inclusive
pub const YEAR_RANGE: (i32, i32) = (1950, 2023);
/// Fallback loudness range (dB)
pub const LOUDNESS_RANGE: (f64, f64) = (-60.0, 0.0);

/// Seeded source of fallback values for one file
pub struct FallbackGenerator {
    rng: StdRng,
}

impl FallbackGenerator {
    /// Generator for the file identified by `source_key`
    pub fn for_source(base_seed: u64, source_key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(base_seed.to_le_bytes());
        hasher.update(source_key.as_bytes());
        let digest = hasher.finalize();

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        Self {
            rng: StdRng::from_seed(seed),
        }
    }

    pub fn tempo(&mut self) -> f64 {
        self.rng.gen_range(TEMPO_RANGE.0..=TEMPO_RANGE.1)
    }

    pub fn key(&mut self) -> i32 {
        self.rng.gen_range(0..=11)
    }

    pub fn mode(&mut self) -> i32 {
        self.rng.gen_range(0..=1)
    }

    pub fn release_year(&mut self) -> i32 {
        self.rng.gen_range(YEAR_RANGE.0..=YEAR_RANGE.1)
    }

    pub fn loudness(&mut self) -> f64 {
        self.rng.gen_range(LOUDNESS_RANGE.0..=LOUDNESS_RANGE.1)
    }

    pub fn energy(&mut self) -> f64 {
        self.rng.gen_range(0.0..=1.0)
    }

    pub fn danceability(&mut self) -> f64 {
        self.rng.gen_range(0.0..=1.0)
    }
}

/// Fallback title for the `ordinal`-th record
pub fn title(ordinal: usize) -> String {
    format!("Unknown Song {}", ordinal)
}

/// Fallback artist id: zero-padded sequential token
pub fn artist_id(ordinal: usize) -> String {
    format!("AR{:08}", ordinal)
}

/// Fallback artist name with running counter
pub fn artist_name(ordinal: usize) -> String {
    format!("Artist {}", ordinal)
}
