use crate::{
    id::{Namespace, ObjectId},
    object_table::ObjectTable,
};
use std::iter::FusedIterator;

/// Answer of a [`ObjectTable::for_each`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterControl {
    Continue,
    Stop,
}

/// Live entries of an [`ObjectTable`]: the client namespace in index order,
/// then the server namespace.
pub struct Iter<'a, T> {
    table: &'a ObjectTable<T>,
    namespace: Option<Namespace>,
    index: u32,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(table: &'a ObjectTable<T>) -> Self {
        Self {
            table,
            namespace: Some(Namespace::Low),
            index: 0,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (ObjectId, &'a T, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        loop {
            let namespace = self.namespace?;
            let index = self.index;
            match table.slots(namespace).get(index) {
                Some(slot) => {
                    self.index += 1;
                    if let Some((value, flag)) = slot.live() {
                        return ObjectId::from_parts(namespace, index).map(|id| (id, value, flag));
                    }
                }
                None => {
                    self.namespace = match namespace {
                        Namespace::Low => Some(Namespace::High),
                        Namespace::High => None,
                    };
                    self.index = 0;
                }
            }
        }
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
