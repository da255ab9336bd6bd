//! Seeded in-memory listings store with togglable secondary indexes.
//!
//! This is the experiment target shipped with the binary: an Airbnb-style
//! listings collection whose queries answer identically with or without
//! indexes, only at very different cost. Preconditions flip the index state
//! between phases; the orchestrator core never sees anything but operation
//! closures, so a network-backed store drops in the same way.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Markets with coordinate anchors for generated listings.
pub const MARKETS: &[(&str, f64, f64)] = &[
    ("New York", 40.758, -73.985),
    ("San Francisco", 37.775, -122.419),
    ("London", 51.507, -0.127),
    ("Paris", 48.853, 2.349),
    ("Tokyo", 35.689, 139.691),
    ("Sydney", -33.867, 151.209),
];

pub const PROPERTY_TYPES: &[&str] = &["Apartment", "House", "Condominium", "Loft", "Villa"];

/// Vocabulary used for descriptions and text-search terms.
pub const DESCRIPTION_TERMS: &[&str] = &[
    "beach", "downtown", "modern", "cozy", "luxury", "spacious", "quiet", "sunny", "charming",
    "renovated", "central", "garden", "rooftop", "historic", "bright", "minimalist",
];

/// Find-style queries return at most this many documents.
const FIND_LIMIT: usize = 20;
/// Proximity queries return at most this many documents.
const GEO_LIMIT: usize = 10;
/// Aggregation keeps groups with at least this many qualifying listings.
const MIN_GROUP_SIZE: usize = 10;
/// Aggregation reports at most this many groups.
const AGG_LIMIT: usize = 20;

/// Grid cell edge in degrees for the proximity index (roughly 5 km of
/// latitude per cell).
const GEO_CELL_DEG: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct Listing {
    pub market: &'static str,
    pub property_type: &'static str,
    pub accommodates: u8,
    pub price: u32,
    pub review_count: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
}

/// Secondary indexes over the listings, built and dropped as a unit.
#[derive(Debug, Default)]
struct Indexes {
    by_market: HashMap<&'static str, Vec<usize>>,
    by_price: BTreeMap<u32, Vec<usize>>,
    text_tokens: HashMap<&'static str, Vec<usize>>,
    geo_grid: HashMap<(i32, i32), Vec<usize>>,
}

fn geo_cell(latitude: f64, longitude: f64) -> (i32, i32) {
    (
        (latitude / GEO_CELL_DEG).floor() as i32,
        (longitude / GEO_CELL_DEG).floor() as i32,
    )
}

impl Indexes {
    fn build(listings: &[Listing]) -> Self {
        let mut indexes = Self::default();
        for (position, listing) in listings.iter().enumerate() {
            indexes
                .by_market
                .entry(listing.market)
                .or_default()
                .push(position);
            indexes
                .by_price
                .entry(listing.price)
                .or_default()
                .push(position);
            for &term in DESCRIPTION_TERMS {
                if listing.description.contains(term) {
                    indexes.text_tokens.entry(term).or_default().push(position);
                }
            }
            indexes
                .geo_grid
                .entry(geo_cell(listing.latitude, listing.longitude))
                .or_default()
                .push(position);
        }
        indexes
    }
}

/// In-memory listings collection with togglable secondary indexes.
#[derive(Debug)]
pub struct ListingStore {
    listings: Vec<Listing>,
    indexes: RwLock<Option<Indexes>>,
}

impl ListingStore {
    /// Generate a deterministic collection of `count` listings.
    pub fn seeded(count: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let listings = (0..count)
            .map(|_| {
                let (market, anchor_lat, anchor_lon) = MARKETS[rng.random_range(0..MARKETS.len())];
                let property_type = PROPERTY_TYPES[rng.random_range(0..PROPERTY_TYPES.len())];
                let description = (0..8)
                    .map(|_| DESCRIPTION_TERMS[rng.random_range(0..DESCRIPTION_TERMS.len())])
                    .collect::<Vec<_>>()
                    .join(" ");
                Listing {
                    market,
                    property_type,
                    accommodates: rng.random_range(1..=8),
                    price: rng.random_range(30..=500),
                    review_count: rng.random_range(0..=300),
                    latitude: anchor_lat + rng.random_range(-0.2..0.2),
                    longitude: anchor_lon + rng.random_range(-0.2..0.2),
                    description,
                }
            })
            .collect();
        Self {
            listings,
            indexes: RwLock::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Build all secondary indexes. Idempotent.
    pub fn build_indexes(&self) {
        let built = Indexes::build(&self.listings);
        *self.indexes.write().expect("index lock poisoned") = Some(built);
    }

    /// Drop all secondary indexes. Idempotent.
    pub fn drop_indexes(&self) {
        *self.indexes.write().expect("index lock poisoned") = None;
    }

    pub fn indexed(&self) -> bool {
        self.indexes.read().expect("index lock poisoned").is_some()
    }

    /// Compound search: market, property type, minimum guest capacity, and
    /// at least ten reviews.
    pub fn search(&self, market: &str, property_type: &str, min_guests: u8) -> u64 {
        let matches = |listing: &Listing| {
            listing.market == market
                && listing.property_type == property_type
                && listing.accommodates >= min_guests
                && listing.review_count >= 10
        };

        let guard = self.indexes.read().expect("index lock poisoned");
        let count = match guard.as_ref() {
            Some(indexes) => indexes
                .by_market
                .get(market)
                .map_or(0, |positions| {
                    positions
                        .iter()
                        .filter(|&&p| matches(&self.listings[p]))
                        .take(FIND_LIMIT)
                        .count()
                }),
            None => self
                .listings
                .iter()
                .filter(|listing| matches(listing))
                .take(FIND_LIMIT)
                .count(),
        };
        count as u64
    }

    /// Range scan over the nightly price.
    pub fn price_range(&self, min_price: u32, max_price: u32) -> u64 {
        let guard = self.indexes.read().expect("index lock poisoned");
        let count = match guard.as_ref() {
            Some(indexes) => indexes
                .by_price
                .range(min_price..=max_price)
                .flat_map(|(_, positions)| positions)
                .take(FIND_LIMIT)
                .count(),
            None => self
                .listings
                .iter()
                .filter(|listing| listing.price >= min_price && listing.price <= max_price)
                .take(FIND_LIMIT)
                .count(),
        };
        count as u64
    }

    /// Whole-word text search over descriptions.
    pub fn text_search(&self, term: &str) -> u64 {
        let guard = self.indexes.read().expect("index lock poisoned");
        let count = match guard.as_ref() {
            Some(indexes) => indexes
                .text_tokens
                .get(term)
                .map_or(0, |positions| positions.len().min(FIND_LIMIT)),
            None => self
                .listings
                .iter()
                .filter(|listing| listing.description.contains(term))
                .take(FIND_LIMIT)
                .count(),
        };
        count as u64
    }

    /// Proximity search within `radius_deg` degrees of a point.
    pub fn geo_near(&self, latitude: f64, longitude: f64, radius_deg: f64) -> u64 {
        let within = |listing: &Listing| {
            let d_lat = listing.latitude - latitude;
            let d_lon = listing.longitude - longitude;
            d_lat * d_lat + d_lon * d_lon <= radius_deg * radius_deg
        };

        let guard = self.indexes.read().expect("index lock poisoned");
        let count = match guard.as_ref() {
            Some(indexes) => {
                let reach = (radius_deg / GEO_CELL_DEG).ceil() as i32;
                let (center_lat, center_lon) = geo_cell(latitude, longitude);
                let mut found = 0usize;
                'cells: for lat_cell in (center_lat - reach)..=(center_lat + reach) {
                    for lon_cell in (center_lon - reach)..=(center_lon + reach) {
                        let Some(positions) = indexes.geo_grid.get(&(lat_cell, lon_cell)) else {
                            continue;
                        };
                        for &position in positions {
                            if within(&self.listings[position]) {
                                found += 1;
                                if found == GEO_LIMIT {
                                    break 'cells;
                                }
                            }
                        }
                    }
                }
                found
            }
            None => self
                .listings
                .iter()
                .filter(|listing| within(listing))
                .take(GEO_LIMIT)
                .count(),
        };
        count as u64
    }

    /// Grouped aggregation: count (market, property type) groups with at
    /// least [`MIN_GROUP_SIZE`] listings above a review threshold.
    pub fn aggregate_markets(&self, min_reviews: u32) -> u64 {
        let guard = self.indexes.read().expect("index lock poisoned");
        let groups = match guard.as_ref() {
            Some(indexes) => {
                // Market lists are pre-partitioned, so grouping only needs
                // to split each market by property type.
                let mut groups: HashMap<(&str, &str), usize> = HashMap::new();
                for positions in indexes.by_market.values() {
                    for &position in positions {
                        let listing = &self.listings[position];
                        if listing.review_count >= min_reviews {
                            *groups
                                .entry((listing.market, listing.property_type))
                                .or_default() += 1;
                        }
                    }
                }
                groups
            }
            None => {
                let mut groups: HashMap<(&str, &str), usize> = HashMap::new();
                for listing in &self.listings {
                    if listing.review_count >= min_reviews {
                        *groups
                            .entry((listing.market, listing.property_type))
                            .or_default() += 1;
                    }
                }
                groups
            }
        };
        groups
            .values()
            .filter(|&&size| size >= MIN_GROUP_SIZE)
            .take(AGG_LIMIT)
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ListingStore {
        ListingStore::seeded(2000, 99)
    }

    #[test]
    fn seeding_is_deterministic() {
        let a = ListingStore::seeded(100, 7);
        let b = ListingStore::seeded(100, 7);
        assert_eq!(a.len(), 100);
        for (x, y) in a.listings.iter().zip(&b.listings) {
            assert_eq!(x.market, y.market);
            assert_eq!(x.price, y.price);
            assert_eq!(x.description, y.description);
        }
    }

    #[test]
    fn index_state_toggles() {
        let store = store();
        assert!(!store.indexed());
        store.build_indexes();
        assert!(store.indexed());
        store.build_indexes(); // idempotent
        assert!(store.indexed());
        store.drop_indexes();
        assert!(!store.indexed());
    }

    #[test]
    fn indexed_queries_agree_with_scans() {
        let store = store();

        let scan = (
            store.search("Paris", "Apartment", 2),
            store.price_range(80, 200),
            store.text_search("luxury"),
            store.geo_near(48.853, 2.349, 0.05),
            store.aggregate_markets(5),
        );

        store.build_indexes();
        let indexed = (
            store.search("Paris", "Apartment", 2),
            store.price_range(80, 200),
            store.text_search("luxury"),
            store.geo_near(48.853, 2.349, 0.05),
            store.aggregate_markets(5),
        );

        assert_eq!(scan, indexed);
    }

    #[test]
    fn unknown_terms_and_markets_return_empty() {
        let store = store();
        store.build_indexes();
        assert_eq!(store.search("Atlantis", "Apartment", 1), 0);
        assert_eq!(store.text_search("submarine"), 0);
    }

    #[test]
    fn queries_respect_result_limits() {
        let store = ListingStore::seeded(50_000, 3);
        assert!(store.price_range(30, 500) <= FIND_LIMIT as u64);
        assert!(store.geo_near(40.758, -73.985, 0.2) <= GEO_LIMIT as u64);
        store.build_indexes();
        assert!(store.price_range(30, 500) <= FIND_LIMIT as u64);
        assert!(store.geo_near(40.758, -73.985, 0.2) <= GEO_LIMIT as u64);
    }
}
