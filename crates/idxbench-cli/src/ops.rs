//! The operation catalogue wired against the listings store.
//!
//! Weights mirror the production query mix: compound search dominates,
//! range and proximity queries are common, text search and the grouped
//! aggregation are occasional.

use crate::store::{ListingStore, DESCRIPTION_TERMS, MARKETS, PROPERTY_TYPES};
use idxbench_core::{ExperimentError, OperationRegistry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};

/// Per-operation parameter RNG. Bodies are `Fn`, so the generator sits
/// behind a mutex; it is uncontended in practice since each lock spans a
/// handful of draws.
fn param_rng(seed: u64, salt: u64) -> Arc<Mutex<ChaCha8Rng>> {
    Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed ^ salt)))
}

fn draw<T>(rng: &Mutex<ChaCha8Rng>, sample: impl FnOnce(&mut ChaCha8Rng) -> T) -> T {
    sample(&mut rng.lock().expect("parameter rng lock poisoned"))
}

/// Build the full operation catalogue over a shared store.
pub fn build_registry(
    store: &Arc<ListingStore>,
    seed: u64,
) -> Result<OperationRegistry, ExperimentError> {
    let mut registry = OperationRegistry::new();

    {
        let store = Arc::clone(store);
        let rng = param_rng(seed, 0x5EA7);
        registry.register("property_search", 3, move || {
            let (market, property_type, min_guests) = draw(&rng, |r| {
                (
                    MARKETS[r.random_range(0..MARKETS.len())].0,
                    PROPERTY_TYPES[r.random_range(0..PROPERTY_TYPES.len())],
                    r.random_range(1..=4u8),
                )
            });
            let store = Arc::clone(&store);
            async move { Ok(store.search(market, property_type, min_guests)) }
        })?;
    }

    {
        let store = Arc::clone(store);
        let rng = param_rng(seed, 0x9010);
        registry.register("price_range", 2, move || {
            let (min_price, max_price) = draw(&rng, |r| {
                let min = r.random_range(50..=150u32);
                (min, min + r.random_range(100..=300u32))
            });
            let store = Arc::clone(&store);
            async move { Ok(store.price_range(min_price, max_price)) }
        })?;
    }

    {
        let store = Arc::clone(store);
        let rng = param_rng(seed, 0x6E0);
        registry.register("geo_proximity", 2, move || {
            let (latitude, longitude) = draw(&rng, |r| {
                let (_, lat, lon) = MARKETS[r.random_range(0..MARKETS.len())];
                (lat + r.random_range(-0.1..0.1), lon + r.random_range(-0.1..0.1))
            });
            let store = Arc::clone(&store);
            async move { Ok(store.geo_near(latitude, longitude, 0.05)) }
        })?;
    }

    {
        let store = Arc::clone(store);
        let rng = param_rng(seed, 0x7E27);
        registry.register("text_search", 1, move || {
            let term =
                draw(&rng, |r| DESCRIPTION_TERMS[r.random_range(0..DESCRIPTION_TERMS.len())]);
            let store = Arc::clone(&store);
            async move { Ok(store.text_search(term)) }
        })?;
    }

    {
        let store = Arc::clone(store);
        let rng = param_rng(seed, 0xA66);
        registry.register("aggregation", 1, move || {
            let min_reviews = draw(&rng, |r| r.random_range(5..=50u32));
            let store = Arc::clone(&store);
            async move { Ok(store.aggregate_markets(min_reviews)) }
        })?;
    }

    Ok(registry)
}
