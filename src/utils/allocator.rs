use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Opaque handle to a grid owned by a [`crate::GridManager`].
///
/// Slots are reused, but a handle to a removed grid never resolves again.
/// Ordering follows the slot index and is used to break ties
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GridId {
    index: u32,
    generation: u32,
}

impl GridId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for GridId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Generational slot storage.
#[derive(Debug)]
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, item: T) -> GridId {
        self.len += 1;
        if let Some(index) = self.free_list.pop_front() {
            self.items[index] = Some(item);
            return GridId::new(index, self.generations[index]);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        GridId::new(index, 0)
    }

    pub fn contains(&self, id: GridId) -> bool {
        self.generations.get(id.index()) == Some(&id.generation)
            && self.items[id.index()].is_some()
    }

    pub fn get(&self, id: GridId) -> Option<&T> {
        if self.contains(id) {
            self.items[id.index()].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: GridId) -> Option<&mut T> {
        if self.contains(id) {
            self.items[id.index()].as_mut()
        } else {
            None
        }
    }

    /// Borrows two distinct live slots at once.
    pub fn get2_mut(&mut self, a: GridId, b: GridId) -> Option<(&mut T, &mut T)> {
        if a.index() == b.index() || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (lo, hi, flipped) = if a.index() < b.index() {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (left, right) = self.items.split_at_mut(hi);
        let first = left[lo].as_mut()?;
        let second = right[0].as_mut()?;

        if flipped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    pub fn remove(&mut self, id: GridId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        let index = id.index();
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push_back(index);
        self.len -= 1;
        self.items[index].take()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = GridId> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| GridId::new(index, self.generations[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ids_do_not_resolve() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        let b = arena.insert(2);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b), Some(&2));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn get2_mut_rejects_aliasing() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert!(arena.get2_mut(a, a).is_none());
        let (x, y) = arena.get2_mut(b, a).unwrap();
        std::mem::swap(x, y);
        assert_eq!(arena.get(a), Some(&2));
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![a, b]);
    }
}
