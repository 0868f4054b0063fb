//! Identity and content contracts consumed by the diff engine.

use crate::item_source::{size_of, ItemSource};

/// Caller-supplied predicates deciding how two items relate.
///
/// `are_contents_the_same` is only ever asked about pairs for which
/// `are_items_the_same` already answered true.
pub trait ItemDiffer<T> {
    /// True if `old` and `new` represent the same logical entity.
    fn are_items_the_same(&self, old: &T, new: &T) -> bool;

    /// True if no visible field differs between two identity-equal items.
    fn are_contents_the_same(&self, old: &T, new: &T) -> bool;
}

/// [`ItemDiffer`] built from two closures.
pub struct FnDiffer<I, C> {
    identity: I,
    content: C,
}

impl<I, C> FnDiffer<I, C> {
    pub fn new(identity: I, content: C) -> Self {
        Self { identity, content }
    }
}

impl<T, I, C> ItemDiffer<T> for FnDiffer<I, C>
where
    I: Fn(&T, &T) -> bool,
    C: Fn(&T, &T) -> bool,
{
    fn are_items_the_same(&self, old: &T, new: &T) -> bool {
        (self.identity)(old, new)
    }

    fn are_contents_the_same(&self, old: &T, new: &T) -> bool {
        (self.content)(old, new)
    }
}

impl<I, C> std::fmt::Debug for FnDiffer<I, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDiffer").finish_non_exhaustive()
    }
}

/// [`ItemDiffer`] comparing identity through a key extractor and content
/// through `PartialEq`.
#[derive(Clone, Copy, Debug)]
pub struct KeyedDiffer<K> {
    key: K,
}

impl<K> KeyedDiffer<K> {
    pub fn new(key: K) -> Self {
        Self { key }
    }
}

impl<T, K, Id> ItemDiffer<T> for KeyedDiffer<K>
where
    T: PartialEq,
    K: Fn(&T) -> Id,
    Id: PartialEq,
{
    fn are_items_the_same(&self, old: &T, new: &T) -> bool {
        (self.key)(old) == (self.key)(new)
    }

    fn are_contents_the_same(&self, old: &T, new: &T) -> bool {
        old == new
    }
}

/// Positional view of one comparison, as seen by the diff engine.
pub trait DiffCallback {
    fn old_len(&self) -> usize;

    fn new_len(&self) -> usize;

    /// Identity of `old[old_position]` and `new[new_position]`.
    fn are_items_the_same(&self, old_position: usize, new_position: usize) -> bool;

    /// Content equality of an identity-equal pair.
    fn are_contents_the_same(&self, old_position: usize, new_position: usize) -> bool;
}

/// [`DiffCallback`] over two item sources.
///
/// Identity resolution order:
/// 1. both positions expose a stable id: compare ids
/// 2. otherwise read both items without fetching or paginating; if either is
///    unresolved the pair is not the same entity
/// 3. otherwise ask the [`ItemDiffer`]
///
/// An absent source behaves as an empty list.
pub struct SourceDiffCallback<'a, S: ?Sized, D: ?Sized> {
    old: Option<&'a S>,
    new: Option<&'a S>,
    differ: &'a D,
}

impl<'a, S, D> SourceDiffCallback<'a, S, D>
where
    S: ItemSource + ?Sized,
    D: ItemDiffer<S::Item> + ?Sized,
{
    pub fn new(old: Option<&'a S>, new: Option<&'a S>, differ: &'a D) -> Self {
        Self { old, new, differ }
    }

    fn peek(source: Option<&S>, position: usize) -> Option<S::Item> {
        source.and_then(|source| source.get_item(position, false, false))
    }
}

impl<S, D> DiffCallback for SourceDiffCallback<'_, S, D>
where
    S: ItemSource + ?Sized,
    D: ItemDiffer<S::Item> + ?Sized,
{
    fn old_len(&self) -> usize {
        size_of(self.old)
    }

    fn new_len(&self) -> usize {
        size_of(self.new)
    }

    fn are_items_the_same(&self, old_position: usize, new_position: usize) -> bool {
        let old_id = self.old.and_then(|s| s.stable_id_at(old_position));
        let new_id = self.new.and_then(|s| s.stable_id_at(new_position));
        if let (Some(old_id), Some(new_id)) = (old_id, new_id) {
            return old_id == new_id;
        }

        match (
            Self::peek(self.old, old_position),
            Self::peek(self.new, new_position),
        ) {
            (Some(old), Some(new)) => self.differ.are_items_the_same(&old, &new),
            // An unresolved item can't be proven to be anything in particular
            _ => false,
        }
    }

    fn are_contents_the_same(&self, old_position: usize, new_position: usize) -> bool {
        match (
            Self::peek(self.old, old_position),
            Self::peek(self.new, new_position),
        ) {
            (Some(old), Some(new)) => self.differ.are_contents_the_same(&old, &new),
            _ => false,
        }
    }
}

/// [`DiffCallback`] over two slices with an [`ItemDiffer`].
pub struct SliceDiffCallback<'a, T, D: ?Sized> {
    old: &'a [T],
    new: &'a [T],
    differ: &'a D,
}

impl<'a, T, D: ItemDiffer<T> + ?Sized> SliceDiffCallback<'a, T, D> {
    pub fn new(old: &'a [T], new: &'a [T], differ: &'a D) -> Self {
        Self { old, new, differ }
    }
}

impl<T, D: ItemDiffer<T> + ?Sized> DiffCallback for SliceDiffCallback<'_, T, D> {
    fn old_len(&self) -> usize {
        self.old.len()
    }

    fn new_len(&self) -> usize {
        self.new.len()
    }

    fn are_items_the_same(&self, old_position: usize, new_position: usize) -> bool {
        self.differ
            .are_items_the_same(&self.old[old_position], &self.new[new_position])
    }

    fn are_contents_the_same(&self, old_position: usize, new_position: usize) -> bool {
        self.differ
            .are_contents_the_same(&self.old[old_position], &self.new[new_position])
    }
}
