use crate::{error::TableError, id::Namespace};
use std::mem;
use tracing::{trace, warn};

/// One cell of a namespace. Free cells double as links of the free list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot<T> {
    Free { next: Option<u32> },
    /// Reserved for, or vacated by, an object that has no reference yet.
    Empty,
    Live { value: T, flag: bool },
}

impl<T> Slot<T> {
    pub fn is_free(&self) -> bool {
        matches!(self, Slot::Free { .. })
    }

    pub fn live(&self) -> Option<(&T, bool)> {
        match self {
            Slot::Live { value, flag } => Some((value, *flag)),
            _ => None,
        }
    }

    fn next_free(&self) -> Option<u32> {
        match self {
            Slot::Free { next } => *next,
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Slot::Live { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// The growable slot storage of a single namespace.
#[derive(Debug)]
pub(crate) struct SlotArray<T> {
    namespace: Namespace,
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    limit: u32,
}

impl<T> SlotArray<T> {
    pub fn new(namespace: Namespace, limit: u32) -> Self {
        Self {
            namespace,
            slots: Vec::new(),
            free_head: None,
            limit,
        }
    }

    pub fn len(&self) -> u32 {
        // Never exceeds `limit`, which is a u32.
        self.slots.len() as u32
    }

    pub fn get(&self, index: u32) -> Option<&Slot<T>> {
        self.slots.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut Slot<T>> {
        self.slots.get_mut(index as usize)
    }

    /// Stores `slot` at the most recently freed index, or appends it when the
    /// free list is empty.
    pub fn allocate(&mut self, slot: Slot<T>) -> Result<u32, TableError> {
        match self.free_head {
            Some(index) => {
                let previous = mem::replace(&mut self.slots[index as usize], slot);
                debug_assert!(previous.is_free(), "free list points at a used slot");
                self.free_head = previous.next_free();
                trace!(namespace = %self.namespace, index, "reused slot");
                Ok(index)
            }
            None => self.push(slot),
        }
    }

    /// Appends a slot, refusing to grow past the limit. On failure nothing is
    /// modified.
    pub fn push(&mut self, slot: Slot<T>) -> Result<u32, TableError> {
        let index = self.len();
        if index >= self.limit {
            warn!(namespace = %self.namespace, limit = self.limit, "object limit reached");
            return Err(TableError::AllocationFailed {
                namespace: self.namespace,
            });
        }
        if self.slots.try_reserve(1).is_err() {
            warn!(namespace = %self.namespace, len = index, "could not grow slot array");
            return Err(TableError::AllocationFailed {
                namespace: self.namespace,
            });
        }
        self.slots.push(slot);
        trace!(namespace = %self.namespace, index, "appended slot");
        Ok(index)
    }

    /// Overwrites an existing slot, returning what it held. A free slot is
    /// unlinked from the free list first.
    pub fn replace(&mut self, index: u32, slot: Slot<T>) -> Slot<T> {
        if self.slots[index as usize].is_free() {
            self.unlink(index);
        }
        mem::replace(&mut self.slots[index as usize], slot)
    }

    /// Frees a slot and pushes it on the free list. Out of range and already
    /// free slots are left alone.
    pub fn release(&mut self, index: u32) -> Option<T> {
        let free_head = self.free_head;
        let slot = self.slots.get_mut(index as usize)?;
        if slot.is_free() {
            return None;
        }
        let previous = mem::replace(slot, Slot::Free { next: free_head });
        self.free_head = Some(index);
        trace!(namespace = %self.namespace, index, "released slot");
        previous.into_value()
    }

    fn unlink(&mut self, index: u32) {
        let next = self.slots[index as usize].next_free();
        if self.free_head == Some(index) {
            self.free_head = next;
            return;
        }
        let mut cursor = self.free_head;
        while let Some(current) = cursor {
            let link = match &mut self.slots[current as usize] {
                Slot::Free { next } => next,
                _ => return,
            };
            if *link == Some(index) {
                *link = next;
                return;
            }
            cursor = *link;
        }
    }

    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.free_head = None;
    }

    pub fn iter_live(&self) -> impl Iterator<Item = (u32, &T, bool)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.live().map(|(value, flag)| (index as u32, value, flag)))
    }

    #[cfg(test)]
    pub fn free_indices(&self) -> Vec<u32> {
        std::iter::successors(self.free_head, |index| self.slots[*index as usize].next_free())
            .collect()
    }
}
