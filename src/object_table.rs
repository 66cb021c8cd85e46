use crate::{
    error::{InvalidIdReason, TableError},
    id::{Namespace, ObjectId, Side, MAX_OBJECTS},
    iter::{IterControl, Iter},
    slots::{Slot, SlotArray},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOpts {
    max_objects: u32,
}
impl Default for TableOpts {
    fn default() -> Self {
        Self {
            max_objects: MAX_OBJECTS,
        }
    }
}
impl TableOpts {
    /// Lowers the per-namespace slot limit. It can never be raised above
    /// [`MAX_OBJECTS`].
    pub fn with_max_objects(self, max_objects: u32) -> Self {
        Self {
            max_objects: max_objects.min(MAX_OBJECTS),
        }
    }
    pub fn max_objects(&self) -> u32 {
        self.max_objects
    }
}

/// Maps protocol object IDs to references of type `T`.
///
/// The table keeps one slot array per [`Namespace`]. The side it was created
/// for decides which namespace it allocates into ([`insert_new`]) and frees
/// from ([`remove`]); the other namespace is filled in by the peer through
/// [`insert_at`] and [`reserve_new`]. Each entry carries one bit of metadata
/// whose meaning belongs to the caller.
///
/// [`insert_new`]: ObjectTable::insert_new
/// [`remove`]: ObjectTable::remove
/// [`insert_at`]: ObjectTable::insert_at
/// [`reserve_new`]: ObjectTable::reserve_new
#[derive(Debug)]
pub struct ObjectTable<T> {
    side: Side,
    opts: TableOpts,
    namespaces: [SlotArray<T>; 2],
}

impl<T> ObjectTable<T> {
    pub fn new(side: Side) -> Self {
        Self::with_opts(side, TableOpts::default())
    }

    pub fn with_opts(side: Side, opts: TableOpts) -> Self {
        Self {
            side,
            opts,
            namespaces: [
                SlotArray::new(Namespace::Low, opts.max_objects),
                SlotArray::new(Namespace::High, opts.max_objects),
            ],
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn opts(&self) -> TableOpts {
        self.opts
    }

    /// Number of slots (live, empty or free) in a namespace.
    pub fn len(&self, namespace: Namespace) -> u32 {
        self.slots(namespace).len()
    }

    pub fn live_count(&self) -> usize {
        self.namespaces
            .iter()
            .map(|slots| slots.iter_live().count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub(crate) fn slots(&self, namespace: Namespace) -> &SlotArray<T> {
        &self.namespaces[namespace.slot()]
    }

    fn slots_mut(&mut self, namespace: Namespace) -> &mut SlotArray<T> {
        &mut self.namespaces[namespace.slot()]
    }

    /// Allocates a fresh ID in this side's own namespace, reusing the most
    /// recently removed one if there is any.
    pub fn insert_new(&mut self, flag: bool, value: T) -> Result<ObjectId, TableError> {
        let namespace = self.side.own_namespace();
        let index = self
            .slots_mut(namespace)
            .allocate(Slot::Live { value, flag })?;
        ObjectId::from_parts(namespace, index).ok_or(TableError::AllocationFailed { namespace })
    }

    /// Binds `value` to an ID chosen by the caller, in either namespace.
    ///
    /// The ID may name an existing slot, which is overwritten, or the slot
    /// right after the last one. Returns the reference that was displaced.
    pub fn insert_at(
        &mut self,
        flag: bool,
        id: ObjectId,
        value: T,
    ) -> Result<Option<T>, TableError> {
        let (namespace, index) = id.split();
        let previous = self.place(id, Slot::Live { value, flag })?;
        debug!(%namespace, index, flag, "bound object");
        Ok(previous.and_then(Slot::into_value))
    }

    /// Reserves a slot in the peer's namespace for an object that has been
    /// announced but not created yet.
    pub fn reserve_new(&mut self, id: ObjectId) -> Result<(), TableError> {
        let (namespace, index) = id.split();
        if namespace != self.side.peer_namespace() {
            return Err(TableError::invalid(id, InvalidIdReason::WrongNamespace));
        }
        if let Some(Slot::Live { .. }) = self.slots(namespace).get(index) {
            return Err(TableError::invalid(id, InvalidIdReason::Occupied));
        }
        self.place(id, Slot::Empty)?;
        debug!(%namespace, index, "reserved object id");
        Ok(())
    }

    /// Stores `slot` at the position named by `id`. Returns the old slot when
    /// one was overwritten, `None` when the namespace grew.
    fn place(&mut self, id: ObjectId, slot: Slot<T>) -> Result<Option<Slot<T>>, TableError> {
        let (namespace, index) = id.split();
        let limit = self.opts.max_objects;
        let slots = self.slots_mut(namespace);
        let len = slots.len();
        if index > len {
            let reason = if index >= limit {
                InvalidIdReason::OutOfRange
            } else {
                InvalidIdReason::SkipsAhead
            };
            return Err(TableError::invalid(id, reason));
        }
        if index == len {
            slots.push(slot)?;
            Ok(None)
        } else {
            Ok(Some(slots.replace(index, slot)))
        }
    }

    /// Frees an ID from this side's own namespace so `insert_new` can hand it
    /// out again. IDs in the peer's namespace are ignored.
    pub fn remove(&mut self, id: ObjectId) -> Option<T> {
        let (namespace, index) = id.split();
        if namespace != self.side.own_namespace() {
            return None;
        }
        self.slots_mut(namespace).release(index)
    }

    /// Drops the reference held under `id` but keeps the slot allocated, so
    /// the ID can neither be looked up nor reused until it is rebound or
    /// removed. Works in both namespaces; free slots are left alone.
    pub fn vacate(&mut self, id: ObjectId) -> Option<T> {
        let (namespace, index) = id.split();
        let slot = self.slots_mut(namespace).get_mut(index)?;
        if slot.is_free() {
            return None;
        }
        debug!(%namespace, index, "vacated object id");
        std::mem::replace(slot, Slot::Empty).into_value()
    }

    pub fn lookup(&self, id: ObjectId) -> Option<&T> {
        self.live(id).map(|(value, _)| value)
    }

    pub fn lookup_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        let (namespace, index) = id.split();
        match self.slots_mut(namespace).get_mut(index) {
            Some(Slot::Live { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub fn lookup_flags(&self, id: ObjectId) -> bool {
        self.live(id).map_or(false, |(_, flag)| flag)
    }

    fn live(&self, id: ObjectId) -> Option<(&T, bool)> {
        let (namespace, index) = id.split();
        self.slots(namespace).get(index).and_then(Slot::live)
    }

    /// Live entries, client namespace first, each in index order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Calls `visit` for every live entry in [`iter`](Self::iter) order until
    /// it asks to stop. Returns the last answer of `visit`.
    pub fn for_each<F>(&self, mut visit: F) -> IterControl
    where
        F: FnMut(&T, bool) -> IterControl,
    {
        for (_, value, flag) in self.iter() {
            if let IterControl::Stop = visit(value, flag) {
                return IterControl::Stop;
            }
        }
        IterControl::Continue
    }

    /// Drops every entry in both namespaces.
    pub fn clear(&mut self) {
        for slots in &mut self.namespaces {
            slots.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SERVER_ID_START;
    use pretty_assertions::assert_eq;

    fn id(raw: u32) -> ObjectId {
        ObjectId::new(raw)
    }

    fn high(index: u32) -> ObjectId {
        id(SERVER_ID_START + index)
    }

    fn small(side: Side, limit: u32) -> ObjectTable<&'static str> {
        ObjectTable::with_opts(side, TableOpts::default().with_max_objects(limit))
    }

    #[test]
    fn client_scenario() {
        let mut table = ObjectTable::new(Side::Client);
        assert_eq!(table.insert_new(false, "A"), Ok(id(0)));
        assert_eq!(table.insert_new(true, "B"), Ok(id(1)));
        assert_eq!(table.remove(id(0)), Some("A"));
        assert_eq!(table.insert_new(false, "C"), Ok(id(0)));
        assert_eq!(table.lookup(id(1)), Some(&"B"));
        assert!(table.lookup_flags(id(1)));
        assert!(!table.lookup_flags(id(0)));
    }

    #[test]
    fn fresh_ids_count_up_from_the_namespace_base() {
        let mut client = ObjectTable::new(Side::Client);
        let mut server = ObjectTable::new(Side::Server);
        for expected in 0..50 {
            assert_eq!(client.insert_new(false, expected), Ok(id(expected)));
            assert_eq!(server.insert_new(false, expected), Ok(high(expected)));
        }
        assert_eq!(client.len(Namespace::Low), 50);
        assert_eq!(client.len(Namespace::High), 0);
        assert_eq!(server.len(Namespace::High), 50);
    }

    #[test]
    fn removed_ids_are_reused_last_in_first_out() {
        let mut table = ObjectTable::new(Side::Server);
        let ids = (0..5)
            .map(|n| table.insert_new(false, n).unwrap())
            .collect::<Vec<_>>();
        table.remove(ids[1]);
        table.remove(ids[3]);
        table.remove(ids[0]);

        assert_eq!(table.insert_new(false, 10), Ok(ids[0]));
        assert_eq!(table.insert_new(false, 11), Ok(ids[3]));
        table.remove(ids[4]);
        assert_eq!(table.insert_new(false, 12), Ok(ids[4]));
        assert_eq!(table.insert_new(false, 13), Ok(ids[1]));
        assert_eq!(table.insert_new(false, 14), Ok(high(5)));
    }

    #[test]
    fn repeated_remove_and_insert_cycles_through_most_recent() {
        let mut table = ObjectTable::new(Side::Client);
        for n in 0..4 {
            table.insert_new(false, n).unwrap();
        }
        for round in 0..10 {
            let victim = id(round % 4);
            table.remove(victim);
            assert_eq!(table.insert_new(false, 100 + round), Ok(victim));
        }
        assert_eq!(table.len(Namespace::Low), 4);
    }

    #[test]
    fn lookup_misses_after_remove() {
        let mut table = ObjectTable::new(Side::Client);
        let a = table.insert_new(true, "a").unwrap();
        assert_eq!(table.lookup(a), Some(&"a"));
        table.remove(a);
        assert_eq!(table.lookup(a), None);
        assert!(!table.lookup_flags(a));
        assert_eq!(table.lookup(id(77)), None);
        assert_eq!(table.lookup(high(0)), None);
    }

    #[test]
    fn remove_ignores_the_peer_namespace() {
        let mut table = ObjectTable::new(Side::Client);
        table.insert_at(false, high(0), "peer").unwrap();
        assert_eq!(table.remove(high(0)), None);
        assert_eq!(table.lookup(high(0)), Some(&"peer"));

        let mut server = ObjectTable::new(Side::Server);
        server.insert_at(false, id(0), "peer").unwrap();
        assert_eq!(server.remove(id(0)), None);
        assert_eq!(server.lookup(id(0)), Some(&"peer"));
    }

    #[test]
    fn insert_at_grows_by_exactly_one() {
        let mut table = ObjectTable::new(Side::Server);
        assert_eq!(table.insert_at(false, id(0), "a"), Ok(None));
        assert_eq!(table.len(Namespace::Low), 1);
        assert_eq!(table.insert_at(true, id(1), "b"), Ok(None));
        assert_eq!(table.len(Namespace::Low), 2);
        assert_eq!(
            table.insert_at(false, id(3), "d"),
            Err(TableError::InvalidId {
                id: id(3),
                reason: InvalidIdReason::SkipsAhead
            })
        );
        assert_eq!(table.len(Namespace::Low), 2);
        assert_eq!(table.lookup(id(1)), Some(&"b"));
        assert!(table.lookup_flags(id(1)));
    }

    #[test]
    fn insert_at_overwrites_in_place() {
        let mut table = ObjectTable::new(Side::Server);
        table.insert_at(true, id(0), "a").unwrap();
        assert_eq!(table.insert_at(false, id(0), "b"), Ok(Some("a")));
        assert_eq!(table.lookup(id(0)), Some(&"b"));
        assert!(!table.lookup_flags(id(0)));
        assert_eq!(table.len(Namespace::Low), 1);
    }

    #[test]
    fn insert_at_past_the_slot_limit_is_invalid() {
        let mut table = ObjectTable::<&str>::new(Side::Client);
        assert_eq!(
            table.insert_at(false, high(MAX_OBJECTS), "x"),
            Err(TableError::InvalidId {
                id: high(MAX_OBJECTS),
                reason: InvalidIdReason::OutOfRange
            })
        );
        assert_eq!(
            table.insert_at(false, id(u32::MAX - SERVER_ID_START), "x"),
            Err(TableError::InvalidId {
                id: id(u32::MAX - SERVER_ID_START),
                reason: InvalidIdReason::OutOfRange
            })
        );
    }

    #[test]
    fn ids_past_a_lowered_limit_are_out_of_range() {
        let mut table = small(Side::Client, 4);
        assert_eq!(
            table.insert_at(false, high(4), "x"),
            Err(TableError::InvalidId {
                id: high(4),
                reason: InvalidIdReason::OutOfRange
            })
        );
        assert_eq!(
            table.reserve_new(high(2)),
            Err(TableError::InvalidId {
                id: high(2),
                reason: InvalidIdReason::SkipsAhead
            })
        );
        assert_eq!(table.len(Namespace::High), 0);
    }

    #[test]
    fn insert_at_on_a_freed_slot_keeps_the_free_list_consistent() {
        let mut table = ObjectTable::new(Side::Client);
        for n in 0..3 {
            table.insert_new(false, n).unwrap();
        }
        table.remove(id(0));
        table.remove(id(1));
        table.insert_at(false, id(1), 42).unwrap();

        assert_eq!(table.insert_new(false, 7), Ok(id(0)));
        assert_eq!(table.insert_new(false, 8), Ok(id(3)));
        assert_eq!(table.lookup(id(1)), Some(&42));
    }

    #[test]
    fn reserve_new_only_targets_the_peer_namespace() {
        let mut client = ObjectTable::<&str>::new(Side::Client);
        assert_eq!(
            client.reserve_new(id(0)),
            Err(TableError::InvalidId {
                id: id(0),
                reason: InvalidIdReason::WrongNamespace
            })
        );
        assert_eq!(client.reserve_new(high(0)), Ok(()));

        let mut server = ObjectTable::<&str>::new(Side::Server);
        assert_eq!(
            server.reserve_new(high(0)),
            Err(TableError::InvalidId {
                id: high(0),
                reason: InvalidIdReason::WrongNamespace
            })
        );
        assert_eq!(server.reserve_new(id(0)), Ok(()));
    }

    #[test]
    fn reserved_ids_stay_empty_until_bound() {
        let mut table = ObjectTable::new(Side::Client);
        table.reserve_new(high(0)).unwrap();
        assert_eq!(table.len(Namespace::High), 1);
        assert_eq!(table.lookup(high(0)), None);
        assert!(table.is_empty());

        // Reserving an empty slot again is fine.
        assert_eq!(table.reserve_new(high(0)), Ok(()));

        table.insert_at(true, high(0), "announced").unwrap();
        assert_eq!(table.lookup(high(0)), Some(&"announced"));
        assert!(table.lookup_flags(high(0)));
        assert_eq!(
            table.reserve_new(high(0)),
            Err(TableError::InvalidId {
                id: high(0),
                reason: InvalidIdReason::Occupied
            })
        );
        assert_eq!(
            table.reserve_new(high(2)),
            Err(TableError::InvalidId {
                id: high(2),
                reason: InvalidIdReason::SkipsAhead
            })
        );
    }

    #[test]
    fn filling_a_namespace_to_the_limit() {
        let mut table = small(Side::Client, 3);
        for n in 0..3 {
            assert_eq!(table.insert_new(false, "x"), Ok(id(n)));
        }
        assert_eq!(
            table.insert_new(false, "overflow"),
            Err(TableError::AllocationFailed {
                namespace: Namespace::Low
            })
        );
        assert_eq!(table.len(Namespace::Low), 3);

        // Existing slots can still be recycled.
        table.remove(id(1));
        assert_eq!(table.insert_new(false, "again"), Ok(id(1)));
    }

    #[test]
    fn limit_applies_to_insert_at_and_reserve_new() {
        let mut table = small(Side::Client, 2);
        table.reserve_new(high(0)).unwrap();
        table.insert_at(false, high(1), "b").unwrap();
        assert_eq!(
            table.reserve_new(high(2)),
            Err(TableError::AllocationFailed {
                namespace: Namespace::High
            })
        );
        assert_eq!(
            table.insert_at(false, high(2), "c"),
            Err(TableError::AllocationFailed {
                namespace: Namespace::High
            })
        );
        assert_eq!(table.len(Namespace::High), 2);
    }

    #[test]
    fn opts_cannot_raise_the_limit() {
        let opts = TableOpts::default().with_max_objects(u32::MAX);
        assert_eq!(opts.max_objects(), MAX_OBJECTS);
        assert_eq!(TableOpts::default().with_max_objects(8).max_objects(), 8);
    }

    #[test]
    fn filling_a_namespace_to_max_objects() {
        let mut table = ObjectTable::new(Side::Server);
        for _ in 0..MAX_OBJECTS {
            table.insert_new(false, ()).unwrap();
        }
        assert_eq!(
            table.insert_new(false, ()),
            Err(TableError::AllocationFailed {
                namespace: Namespace::High
            })
        );
        assert_eq!(table.len(Namespace::High), MAX_OBJECTS);
    }

    #[test]
    fn vacate_keeps_the_id_allocated() {
        let mut table = ObjectTable::new(Side::Server);
        table.insert_at(false, id(0), "client object").unwrap();
        assert_eq!(table.vacate(id(0)), Some("client object"));
        assert_eq!(table.lookup(id(0)), None);
        assert_eq!(table.len(Namespace::Low), 1);
        assert_eq!(table.vacate(id(0)), None);

        // A reused server id never lands on a vacated slot.
        let own = table.insert_new(false, "own").unwrap();
        table.vacate(own);
        assert_eq!(table.insert_new(false, "next"), Ok(high(1)));
        table.remove(own);
        assert_eq!(table.insert_new(false, "reused"), Ok(own));
    }

    #[test]
    fn for_each_visits_low_then_high_and_honours_stop() {
        let mut table = ObjectTable::new(Side::Client);
        table.insert_new(false, "low0").unwrap();
        table.insert_new(true, "low1").unwrap();
        table.insert_at(false, high(0), "high0").unwrap();
        table.remove(id(1));

        let mut seen = Vec::new();
        let result = table.for_each(|value, flag| {
            seen.push((*value, flag));
            IterControl::Continue
        });
        assert_eq!(result, IterControl::Continue);
        assert_eq!(seen, vec![("low0", false), ("high0", false)]);

        let mut seen = Vec::new();
        let result = table.for_each(|value, _| {
            seen.push(*value);
            IterControl::Stop
        });
        assert_eq!(result, IterControl::Stop);
        assert_eq!(seen, vec!["low0"]);
    }

    #[test]
    fn lookup_mut_edits_in_place() {
        let mut table = ObjectTable::new(Side::Client);
        let a = table.insert_new(false, String::from("a")).unwrap();
        table.lookup_mut(a).unwrap().push('!');
        assert_eq!(table.lookup(a).map(String::as_str), Some("a!"));
        table.remove(a);
        assert_eq!(table.lookup_mut(a), None);
    }

    #[test]
    fn clear_empties_both_namespaces() {
        let mut table = ObjectTable::new(Side::Client);
        table.insert_new(false, 1).unwrap();
        table.insert_at(false, high(0), 2).unwrap();
        table.clear();
        assert_eq!(table.len(Namespace::Low), 0);
        assert_eq!(table.len(Namespace::High), 0);
        assert_eq!(table.live_count(), 0);
        assert_eq!(table.insert_new(false, 3), Ok(id(0)));
    }
}
