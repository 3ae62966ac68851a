//! Address resolution cache.
//!
//! Maps entity UUIDs to the addresses the gateway reported for them. Entries
//! are evicted in strict least-recently-used order once the cache is full.
//! Recency is tracked with a monotonically increasing tick per access and an
//! ordered index from tick to UUID, so eviction pops the smallest tick.

use std::collections::{BTreeMap, HashMap};

use knet_core::{Address, Domain, Uuid};

/// Default number of cached addresses.
pub const DEFAULT_CAPACITY: usize = 5000;

struct Slot {
    address: Address,
    tick: u64,
}

/// Bounded LRU cache from entity UUID to [`Address`].
pub struct AddressCache {
    capacity: usize,
    entries: HashMap<Uuid, Slot>,
    /// Recency index: access tick -> UUID, oldest first.
    order: BTreeMap<u64, Uuid>,
    next_tick: u64,
}

impl AddressCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(1024)),
            order: BTreeMap::new(),
            next_tick: 0,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or refresh an entry, marking it most recently used.
    ///
    /// Returns the UUID evicted to make room, if any.
    pub fn put(&mut self, entity: Uuid, address: Address) -> Option<Uuid> {
        let tick = self.bump();

        if let Some(slot) = self.entries.get_mut(&entity) {
            self.order.remove(&slot.tick);
            slot.tick = tick;
            slot.address = address;
            self.order.insert(tick, entity);
            return None;
        }

        self.entries.insert(entity, Slot { address, tick });
        self.order.insert(tick, entity);

        if self.entries.len() > self.capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                self.entries.remove(&oldest);
                tracing::trace!(%oldest, "address cache evicted entry");
                return Some(oldest);
            }
        }
        None
    }

    /// Look up an entry, refreshing its recency on a hit.
    pub fn get(&mut self, entity: &Uuid) -> Option<Address> {
        let tick = self.bump();
        let slot = self.entries.get_mut(entity)?;
        self.order.remove(&slot.tick);
        slot.tick = tick;
        self.order.insert(tick, *entity);
        Some(slot.address.clone())
    }

    /// Look up an entry without touching recency.
    pub fn peek(&self, entity: &Uuid) -> Option<&Address> {
        self.entries.get(entity).map(|slot| &slot.address)
    }

    /// Resolve an entity to an address.
    ///
    /// A cached address wins over the passed `domain` and `hub_host`, since
    /// it came from the gateway. On a miss the address is synthesized: local
    /// when no hub is configured, otherwise `hub_host/domain/entity`. Never
    /// touches the network and never inserts.
    pub fn resolve(&mut self, entity: Uuid, domain: Domain, hub_host: Option<&str>) -> Address {
        if let Some(address) = self.get(&entity) {
            return address;
        }
        match hub_host.filter(|h| !h.is_empty()) {
            Some(hub) => Address::new(hub, domain, entity),
            None => Address::local(domain, entity),
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: Uuid) -> Address {
        Address::new("hub:1", Domain::Fragment, id)
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = AddressCache::new(4);
        let id = Uuid::new_v4();
        assert!(cache.get(&id).is_none());
        cache.put(id, addr(id));
        assert_eq!(cache.get(&id), Some(addr(id)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_inserted() {
        let mut cache = AddressCache::new(3);
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        for id in &ids[..3] {
            assert_eq!(cache.put(*id, addr(*id)), None);
        }
        let evicted = cache.put(ids[3], addr(ids[3]));

        assert_eq!(evicted, Some(ids[0]));
        assert_eq!(cache.len(), 3);
        assert!(cache.peek(&ids[0]).is_none());
        for id in &ids[1..] {
            assert!(cache.peek(id).is_some());
        }
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let mut cache = AddressCache::new(3);
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        for id in &ids[..3] {
            cache.put(*id, addr(*id));
        }
        // Touch the oldest; ids[1] becomes the LRU entry.
        cache.get(&ids[0]);
        let evicted = cache.put(ids[3], addr(ids[3]));

        assert_eq!(evicted, Some(ids[1]));
        assert!(cache.peek(&ids[0]).is_some());
    }

    #[test]
    fn test_reinsert_refreshes_and_replaces() {
        let mut cache = AddressCache::new(2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        cache.put(a, addr(a));
        cache.put(b, addr(b));
        let moved = Address::new("other:2", Domain::Fragment, a);
        assert_eq!(cache.put(a, moved.clone()), None);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.put(c, addr(c)), Some(b));
        assert_eq!(cache.peek(&a), Some(&moved));
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let mut cache = AddressCache::new(2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        cache.put(a, addr(a));
        cache.put(b, addr(b));
        cache.peek(&a);
        assert_eq!(cache.put(c, addr(c)), Some(a));
    }

    #[test]
    fn test_resolve_prefers_cached() {
        let mut cache = AddressCache::new(8);
        let id = Uuid::new_v4();
        let confirmed = Address::new("real-hub:443", Domain::Tag, id);
        cache.put(id, confirmed.clone());

        let resolved = cache.resolve(id, Domain::Fragment, Some("configured:80"));
        assert_eq!(resolved, confirmed);
    }

    #[test]
    fn test_resolve_miss_synthesizes() {
        let mut cache = AddressCache::new(8);
        let id = Uuid::new_v4();

        assert_eq!(
            cache.resolve(id, Domain::Fragment, None),
            Address::local(Domain::Fragment, id)
        );
        assert_eq!(
            cache.resolve(id, Domain::Fragment, Some("")),
            Address::local(Domain::Fragment, id)
        );
        assert_eq!(
            cache.resolve(id, Domain::Agent, Some("hub:9")),
            Address::new("hub:9", Domain::Agent, id)
        );
        // Synthesized addresses are not cached.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(AddressCache::default().capacity(), DEFAULT_CAPACITY);
        assert_eq!(AddressCache::new(0).capacity(), 1);
    }
}
