use std::collections::BTreeMap;

/// Handle returned by [`ListenerRegistry::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Tracks which event listeners are currently registered.
///
/// Every subscription must be paired with an `unsubscribe` on teardown; the
/// registry makes leaks observable through [`ListenerRegistry::len`].
#[derive(Debug)]
pub struct ListenerRegistry<K> {
    next_id: u64,
    active: BTreeMap<ListenerId, K>,
}

impl<K> Default for ListenerRegistry<K> {
    fn default() -> Self {
        Self {
            next_id: 1,
            active: BTreeMap::new(),
        }
    }
}

impl<K: Copy + PartialEq> ListenerRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: K) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active.insert(id, kind);
        id
    }

    /// Returns `true` if the listener was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.active.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn count_of(&self, kind: K) -> usize {
        self.active.values().filter(|k| **k == kind).count()
    }

    /// Listener ids subscribed to `kind`, in registration order.
    pub fn listeners_of(&self, kind: K) -> impl Iterator<Item = ListenerId> + '_ {
        self.active
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(id, _)| *id)
    }
}
