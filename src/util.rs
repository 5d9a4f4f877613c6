use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

/// `0x1234ab…cdef12` for addresses too long to show in full.
pub fn short_address(address: &str) -> String {
    const HEAD: usize = 8;
    const TAIL: usize = 6;

    let char_count = address.chars().count();
    if char_count <= HEAD + TAIL + 1 {
        return address.to_owned();
    }

    let head = address.chars().take(HEAD).collect::<String>();
    let tail = address.chars().skip(char_count - TAIL).collect::<String>();
    format!("{head}…{tail}")
}

/// Pseudo-random offset in `[-1, 1]²` derived from `seed`; the same seed
/// always yields the same offset within one build of the program.
pub fn stable_offset(seed: &str) -> Vec2 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    let hash = hasher.finish();

    let unit = |bits: u64| ((bits & 0xffff_ffff) as f64 / f64::from(u32::MAX)) as f32;
    vec2(unit(hash) * 2.0 - 1.0, unit(hash >> 32) * 2.0 - 1.0)
}
