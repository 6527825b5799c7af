//! Member image assets and the random selection of the outer ring.

#[cfg(test)]
#[path = "roster_test.rs"]
mod roster_test;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const INNER_DIR: &str = "MdwnhSections";
const OUTER_DIR: &str = "Siraj-members";

const INNER_FILES: [&str; 5] = [
    "photo_3_2026-01-20_11-34-16.jpg",
    "photo_5_2026-01-20_11-34-16.jpg",
    "photo_6_2026-01-20_11-34-16.jpg",
    "photo_7_2026-01-20_11-34-16.jpg",
    "photo_8_2026-01-20_11-34-16.jpg",
];

// IMG_7097 and IMG_7099 do not exist.
const OUTER_FILES: [&str; 38] = [
    "IMG_7096.PNG", "IMG_7098.PNG", "IMG_7100.PNG", "IMG_7101.PNG", "IMG_7102.PNG",
    "IMG_7103.PNG", "IMG_7104.PNG", "IMG_7105.PNG", "IMG_7106.PNG", "IMG_7107.PNG",
    "IMG_7108.PNG", "IMG_7109.PNG", "IMG_7110.PNG", "IMG_7111.PNG", "IMG_7112.PNG",
    "IMG_7113.PNG", "IMG_7114.PNG", "IMG_7115.PNG", "IMG_7116.PNG", "IMG_7117.PNG",
    "IMG_7118.PNG", "IMG_7119.PNG", "IMG_7120.PNG", "IMG_7121.PNG", "IMG_7122.PNG",
    "IMG_7123.PNG", "IMG_7124.PNG", "IMG_7125.PNG", "IMG_7126.PNG", "IMG_7127.PNG",
    "IMG_7128.PNG", "IMG_7129.PNG", "IMG_7130.PNG", "IMG_7131.PNG", "IMG_7132.PNG",
    "IMG_7133.PNG", "IMG_7134.PNG", "IMG_7135.PNG",
];

/// Image sources for both rings.
///
/// `inner` is used in order and in full. `outer` is a candidate pool; only a
/// random subset of it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub inner: Vec<String>,
    pub outer: Vec<String>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            inner: INNER_FILES.iter().map(|f| format!("{INNER_DIR}/{f}")).collect(),
            outer: OUTER_FILES.iter().map(|f| format!("{OUTER_DIR}/{f}")).collect(),
        }
    }
}

impl Roster {
    #[must_use]
    pub fn new(inner: Vec<String>, outer: Vec<String>) -> Self {
        Self { inner, outer }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty() && self.outer.is_empty()
    }

    /// Draw up to `count` distinct outer sources in uniformly random order.
    pub fn select_outer<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
        let mut pool = self.outer.clone();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }
}
