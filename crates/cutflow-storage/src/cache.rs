//! Generation-stamped per-variation cache.

use std::collections::HashMap;

use cutflow_core::Variation;

/// One cached payload and the generation it was written in.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSlot<T> {
    generation: u64,
    payload: Option<T>,
}

impl<T> CacheSlot<T> {
    fn empty() -> Self {
        Self {
            generation: 0,
            payload: None,
        }
    }

    /// Valid when written during `generation`.
    pub fn is_valid(&self, generation: u64) -> bool {
        self.payload.is_some() && self.generation == generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set(&mut self, payload: T, generation: u64) {
        self.payload = Some(payload);
        self.generation = generation;
    }

    /// The payload if it belongs to `generation`.
    pub fn get(&self, generation: u64) -> Option<&T> {
        if self.is_valid(generation) {
            self.payload.as_ref()
        } else {
            None
        }
    }
}

/// Map from variation to a lazily created [`CacheSlot`].
///
/// Slots are boxed so their address is stable for the lifetime of the
/// cache, and they are never removed: staleness is detected by comparing
/// the slot generation with the current one.
#[derive(Debug, Clone)]
pub struct VariantCache<T> {
    slots: HashMap<Variation, Box<CacheSlot<T>>>,
}

impl<T> Default for VariantCache<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<T> VariantCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot of `variation`, created empty on first access.
    pub fn get_or_create(&mut self, variation: &Variation) -> &mut CacheSlot<T> {
        self.slots
            .entry(variation.clone())
            .or_insert_with(|| Box::new(CacheSlot::empty()))
    }

    pub fn slot(&self, variation: &Variation) -> Option<&CacheSlot<T>> {
        self.slots.get(variation).map(Box::as_ref)
    }

    /// The payload of `variation` if written during `generation`.
    pub fn get(&self, variation: &Variation, generation: u64) -> Option<&T> {
        self.slot(variation).and_then(|slot| slot.get(generation))
    }

    pub fn set(&mut self, variation: &Variation, payload: T, generation: u64) {
        self.get_or_create(variation).set(payload, generation);
    }

    pub fn is_valid(&self, variation: &Variation, generation: u64) -> bool {
        self.slot(variation).is_some_and(|slot| slot.is_valid(generation))
    }

    /// Number of slots ever created.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_returns_same_slot() {
        let mut cache: VariantCache<i64> = VariantCache::new();
        let jes = Variation::new("JET_JES__1up");

        let first = cache.get_or_create(&jes) as *const CacheSlot<i64>;
        cache.get_or_create(&Variation::nominal());
        cache.get_or_create(&Variation::new("JET_JER__1up"));
        let second = cache.get_or_create(&jes) as *const CacheSlot<i64>;

        assert_eq!(first, second);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_validity_follows_generation() {
        let mut cache = VariantCache::new();
        let nominal = Variation::nominal();

        assert!(!cache.get_or_create(&nominal).is_valid(1));
        cache.set(&nominal, 42, 1);
        assert!(cache.is_valid(&nominal, 1));
        assert_eq!(cache.get(&nominal, 1), Some(&42));

        // next event: stale without any clearing
        assert!(!cache.is_valid(&nominal, 2));
        assert_eq!(cache.get(&nominal, 2), None);
        assert_eq!(cache.slot(&nominal).map(CacheSlot::generation), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fresh_slot_is_never_valid() {
        let mut cache: VariantCache<f64> = VariantCache::new();
        let slot = cache.get_or_create(&Variation::nominal());
        assert!(!slot.is_valid(0));
        assert_eq!(slot.get(0), None);
    }
}
