//! Ore reference table: unit volumes and compression ratios.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::LazyLock;

use lru::LruCache;

/// Capacity of the per-table resolution cache. Raw ore tokens repeat
/// heavily within a session, so a small bound is enough.
const RESOLVE_CACHE_SIZE: usize = 256;

/// Base materials and their unit volume in m3. Grade variants are
/// generated from this list.
const BASE_ORES: &[(&str, f64)] = &[
    // Standard
    ("Veldspar", 0.1),
    ("Scordite", 0.15),
    ("Pyroxeres", 0.3),
    ("Plagioclase", 0.35),
    ("Omber", 0.6),
    ("Kernite", 1.2),
    // Low-sec
    ("Jaspet", 2.0),
    ("Hemorphite", 3.0),
    ("Hedbergite", 3.0),
    // Null-sec
    ("Gneiss", 5.0),
    ("Dark Ochre", 8.0),
    ("Spodumain", 16.0),
    ("Crokite", 16.0),
    ("Bistot", 16.0),
    ("Arkonor", 16.0),
    ("Mercoxit", 40.0),
    // Moon R4
    ("Zeolites", 100.0),
    ("Sylvite", 100.0),
    ("Bitumens", 100.0),
    ("Coesite", 100.0),
    // Moon R8
    ("Cobaltite", 100.0),
    ("Euxenite", 100.0),
    ("Titanite", 100.0),
    ("Scheelite", 100.0),
    // Moon R16
    ("Otavite", 100.0),
    ("Sperrylite", 100.0),
    ("Vanadinite", 100.0),
    ("Chromite", 100.0),
    // Moon R32
    ("Carnotite", 100.0),
    ("Zircon", 100.0),
    ("Pollucite", 100.0),
    ("Cinnabar", 100.0),
    // Moon R64
    ("Xenotime", 100.0),
    ("Monazite", 100.0),
    ("Loparite", 100.0),
    ("Ytterbite", 100.0),
    // Ice
    ("Blue Ice", 1000.0),
    ("Clear Icicle", 1000.0),
    ("Glacial Mass", 1000.0),
    ("White Glaze", 1000.0),
    ("Glare Crust", 1000.0),
    ("Dark Glitter", 1000.0),
    ("Gelidus", 1000.0),
    ("Krystallos", 1000.0),
    // Pochven
    ("Bezdnacine", 16.0),
    ("Rakovene", 16.0),
    ("Talassonite", 16.0),
    // Special
    ("Ueganite", 5.0),
    ("Prismaticite", 16.0),
    ("Ducinium", 16.0),
    // Gas clouds - cytoserocin
    ("Amber Cytoserocin", 10.0),
    ("Azure Cytoserocin", 10.0),
    ("Celadon Cytoserocin", 10.0),
    ("Golden Cytoserocin", 10.0),
    ("Lime Cytoserocin", 10.0),
    ("Vermillion Cytoserocin", 10.0),
    ("Viridian Cytoserocin", 10.0),
    // Gas clouds - mykoserocin
    ("Amber Mykoserocin", 10.0),
    ("Azure Mykoserocin", 10.0),
    ("Celadon Mykoserocin", 10.0),
    ("Golden Mykoserocin", 10.0),
    ("Lime Mykoserocin", 10.0),
    ("Vermillion Mykoserocin", 10.0),
    ("Viridian Mykoserocin", 10.0),
    // Gas clouds - fullerites
    ("Fullerite-C28", 5.0),
    ("Fullerite-C32", 5.0),
    ("Fullerite-C50", 5.0),
    ("Fullerite-C60", 5.0),
    ("Fullerite-C70", 5.0),
    ("Fullerite-C72", 5.0),
    ("Fullerite-C84", 10.0),
    ("Fullerite-C320", 10.0),
    ("Fullerite-C540", 10.0),
];

/// Grade suffix tiers. Mercoxit only occurs up to III-Grade.
const GRADE_SUFFIXES: &[&str] = &["", " II-Grade", " III-Grade", " IV-Grade"];

/// Ice compresses 1:1; everything else at 100:1.
const ICE_ORES: &[&str] = &[
    "Blue Ice",
    "Clear Icicle",
    "Glacial Mass",
    "White Glaze",
    "Glare Crust",
    "Dark Glitter",
    "Gelidus",
    "Krystallos",
];

/// Canonical variant table: exact-match map plus a lowercased list for
/// containment lookups.
struct CanonicalTable {
    exact: HashMap<String, f64>,
    lowercased: Vec<(String, f64)>,
}

static CANONICAL: LazyLock<CanonicalTable> = LazyLock::new(|| {
    let mut exact = HashMap::new();
    let mut lowercased = Vec::new();
    for &(name, volume) in BASE_ORES {
        let suffixes = if name == "Mercoxit" {
            &GRADE_SUFFIXES[..GRADE_SUFFIXES.len() - 1]
        } else {
            GRADE_SUFFIXES
        };
        for suffix in suffixes {
            let variant = format!("{name}{suffix}");
            lowercased.push((variant.to_lowercase(), volume));
            exact.insert(variant, volume);
        }
    }
    CanonicalTable { exact, lowercased }
});

/// A resolved ore name and its unit volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Volume of a single unit in m3.
    pub unit_volume: f64,
    /// Canonical display name (the cleaned raw token).
    pub name: String,
}

/// Memoized raw-token -> (volume, name) resolution.
#[derive(Debug)]
pub struct OreTable {
    cache: LruCache<String, Resolved>,
}

impl Default for OreTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OreTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(
                NonZeroUsize::new(RESOLVE_CACHE_SIZE).expect("nonzero cache size"),
            ),
        }
    }

    /// Resolves a raw ore token to its unit volume and display name.
    ///
    /// Order: exact match after cleanup, then case-insensitive
    /// containment of a known canonical name, then a fallback volume of
    /// 1.0. Unknown ores still aggregate; they just count at unit
    /// volume.
    pub fn resolve(&mut self, raw: &str) -> Resolved {
        if let Some(hit) = self.cache.get(raw) {
            return hit.clone();
        }

        let resolved = resolve_uncached(raw);
        self.cache.put(raw.to_string(), resolved.clone());
        resolved
    }

    /// Units of raw ore represented by one compressed unit.
    #[must_use]
    pub fn compression_ratio(ore: &str) -> u32 {
        if ICE_ORES.contains(&ore) { 1 } else { 100 }
    }
}

fn resolve_uncached(raw: &str) -> Resolved {
    let clean = raw.trim().trim_end_matches('.');

    if let Some(&volume) = CANONICAL.exact.get(clean) {
        return Resolved {
            unit_volume: volume,
            name: clean.to_string(),
        };
    }

    let clean_lower = clean.to_lowercase();
    for (candidate, volume) in &CANONICAL.lowercased {
        if clean_lower.contains(candidate.as_str()) {
            return Resolved {
                unit_volume: *volume,
                name: clean.to_string(),
            };
        }
    }

    tracing::debug!(ore = clean, "unknown ore, defaulting to unit volume 1.0");
    Resolved {
        unit_volume: 1.0,
        name: clean.to_string(),
    }
}
