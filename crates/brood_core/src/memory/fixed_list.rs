//! # Fixed List
//!
//! Append-only buffer with a hard capacity.

use crate::error::{EcsError, EcsResult};

/// A bounded, append-only list.
///
/// All memory is reserved on creation. Pushing past capacity returns
/// [`EcsError::BufferOverflow`] and leaves the list unchanged.
///
/// # Example
///
/// ```rust,ignore
/// let mut doomed: FixedList<EntityId> = FixedList::with_capacity(world.count(set));
///
/// doomed.push(id)?;
/// world.despawn_batch(doomed.as_slice())?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct FixedList<T> {
    /// Stored items. Never grows past `capacity`.
    items: Vec<T>,
    /// Hard capacity.
    capacity: usize,
}

impl<T> FixedList<T> {
    /// Creates an empty list able to hold `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the hard capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of stored items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items that can still be pushed.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.items.len()
    }

    /// Appends one item.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::BufferOverflow`] if the list is full.
    #[inline]
    pub fn push(&mut self, value: T) -> EcsResult<()> {
        if self.items.len() >= self.capacity {
            return Err(self.overflow(1));
        }
        self.items.push(value);
        Ok(())
    }

    /// Appends every item of `values`, or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::BufferOverflow`] if they do not all fit.
    pub fn try_extend<I>(&mut self, values: I) -> EcsResult<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        if values.len() > self.remaining() {
            return Err(self.overflow(values.len()));
        }
        self.items.extend(values);
        Ok(())
    }

    /// Gets an item by index.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::IndexOutOfRange`] past the stored length.
    #[inline]
    pub fn get(&self, index: usize) -> EcsResult<&T> {
        self.items.get(index).ok_or(EcsError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Returns the stored items.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterates over stored items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Removes every item, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn overflow(&self, additional: usize) -> EcsError {
        EcsError::BufferOverflow {
            capacity: self.capacity,
            requested: self.items.len() + additional,
        }
    }
}

impl<T: Copy> FixedList<T> {
    /// Appends a contiguous run of `count` copies of `fill` and returns it
    /// for the caller to overwrite in place.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::BufferOverflow`] if the run does not fit.
    pub fn reserve_run(&mut self, count: usize, fill: T) -> EcsResult<&mut [T]> {
        if count > self.remaining() {
            return Err(self.overflow(count));
        }
        let start = self.items.len();
        self.items.resize(start + count, fill);
        Ok(&mut self.items[start..])
    }
}

impl<'a, T> IntoIterator for &'a FixedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut list = FixedList::with_capacity(2);
        list.push(1u32).unwrap();
        list.push(2).unwrap();

        assert_eq!(
            list.push(3),
            Err(EcsError::BufferOverflow {
                capacity: 2,
                requested: 3
            })
        );
        assert_eq!(list.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut list: FixedList<u8> = FixedList::with_capacity(0);
        assert!(list.is_empty());
        assert!(list.push(0).is_err());
    }

    #[test]
    fn test_try_extend_is_all_or_nothing() {
        let mut list = FixedList::with_capacity(3);
        list.push(0u32).unwrap();
        assert!(list.try_extend([1, 2, 3]).is_err());
        assert_eq!(list.len(), 1);

        list.try_extend([1, 2]).unwrap();
        assert_eq!(list.remaining(), 0);
    }

    #[test]
    fn test_reserve_run() {
        let mut list = FixedList::with_capacity(5);
        list.push(9u32).unwrap();

        let run = list.reserve_run(3, 0).unwrap();
        assert_eq!(run.len(), 3);
        for (i, slot) in run.iter_mut().enumerate() {
            *slot = i as u32 + 10;
        }
        assert_eq!(list.as_slice(), &[9, 10, 11, 12]);
        assert!(list.reserve_run(2, 0).is_err());
    }

    #[test]
    fn test_get_bounds() {
        let mut list = FixedList::with_capacity(4);
        list.push('a').unwrap();
        assert_eq!(list.get(0), Ok(&'a'));
        assert_eq!(
            list.get(1),
            Err(EcsError::IndexOutOfRange { index: 1, len: 1 })
        );

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 4);
    }
}
