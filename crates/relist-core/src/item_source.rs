//! Item source trait for reconciled lists.
//!
//! This module defines the [`ItemSource`] trait, the accessor contract the
//! diff engine and the rendering consumer use to read a possibly
//! partially-loaded list.

/// An ordered, indexable, possibly partially-loaded collection.
///
/// Implementations must be stable for the duration of one diff: the scheduler
/// hands an immutable snapshot (`Arc<S>`) to the worker and never mutates it.
/// A changed data set is a new source instance.
pub trait ItemSource {
    /// The item type yielded by [`get_item`](Self::get_item).
    type Item: Clone;

    /// The number of positions in the list, loaded or not.
    fn size(&self) -> usize;

    /// Returns the item at `position`, or `None` if it is not loaded yet.
    ///
    /// * `fetch_if_absent` - request the missing item from the backing store
    /// * `paginate_if_near_end` - request the next page when `position` is close
    ///   to the end of what is loaded
    ///
    /// The diff engine always passes `false` for both flags; comparing items
    /// must never trigger a fetch. Out-of-range positions yield `None`.
    fn get_item(
        &self,
        position: usize,
        fetch_if_absent: bool,
        paginate_if_near_end: bool,
    ) -> Option<Self::Item>;

    /// Returns a stable id for the item at `position` without resolving it.
    ///
    /// Used as a fast identity check. Defaults to `None` (no stable ids).
    fn stable_id_at(&self, position: usize) -> Option<u64> {
        let _ = position;
        None
    }

    /// Returns true if the list has no positions.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<T: Clone> ItemSource for Vec<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.len()
    }

    fn get_item(&self, position: usize, _fetch: bool, _paginate: bool) -> Option<T> {
        self.get(position).cloned()
    }
}

impl<S: ItemSource + ?Sized> ItemSource for std::sync::Arc<S> {
    type Item = S::Item;

    fn size(&self) -> usize {
        (**self).size()
    }

    fn get_item(
        &self,
        position: usize,
        fetch_if_absent: bool,
        paginate_if_near_end: bool,
    ) -> Option<S::Item> {
        (**self).get_item(position, fetch_if_absent, paginate_if_near_end)
    }

    fn stable_id_at(&self, position: usize) -> Option<u64> {
        (**self).stable_id_at(position)
    }
}

/// Size of an optional source; an absent source is an empty list.
pub fn size_of<S: ItemSource + ?Sized>(source: Option<&S>) -> usize {
    source.map_or(0, ItemSource::size)
}

/// What a consumer sees at a valid list position.
///
/// `Placeholder` is a position whose data has not been fetched yet and is
/// rendered as a loading row. It is distinct from "no such position", which is
/// an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayedItem<T> {
    Item(T),
    Placeholder,
}

impl<T> DisplayedItem<T> {
    /// Returns the resolved item, if any.
    pub fn item(&self) -> Option<&T> {
        match self {
            DisplayedItem::Item(item) => Some(item),
            DisplayedItem::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, DisplayedItem::Placeholder)
    }

    /// Converts into an `Option`, dropping the placeholder distinction.
    pub fn into_item(self) -> Option<T> {
        match self {
            DisplayedItem::Item(item) => Some(item),
            DisplayedItem::Placeholder => None,
        }
    }
}

impl<T> From<Option<T>> for DisplayedItem<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(DisplayedItem::Placeholder, DisplayedItem::Item)
    }
}
