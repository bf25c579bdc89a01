// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod string_id;

use anyhow::Context;
use std::hash::{BuildHasherDefault, Hash};
use std::num::NonZeroU32;

pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;
pub type FxIndexSet<K> = indexmap::IndexSet<K, BuildHasherDefault<rustc_hash::FxHasher>>;

pub use string_id::*;

pub trait Id: Copy + Eq + Hash {
    type RawId;

    /// Convert from a usize offset into an Id. This should be loss-less
    /// except for certain edges.
    /// # Panics
    /// Panic if the usize cannot be represented in the Id, for instance if
    /// the offset cannot fit in the underlying integer type. This is expected
    /// to be ultra-rare (more than u32::MAX-1 items created?!).
    fn from_offset(inner: usize) -> Self;

    fn to_raw_id(&self) -> Self::RawId;
}

pub trait Item: Eq + Hash {
    /// The Id associated with this Item, e.g. Function -> FunctionId.
    type Id: Id;
}

/// Used to associate an Item with a pprof::* type.
pub trait PprofItem: Item {
    /// The pprof::* type associated with this Item.
    /// For example, Function -> pprof::Function.
    type PprofMessage: prost::Message;

    // Items don't store their own id, so they can't do a simple .into() to
    // get a pprof message.
    fn to_pprof(&self, id: Self::Id) -> Self::PprofMessage;
}

/// Creates a non-zero, 32-bit unsigned id from the offset. It's guaranteed to
/// be the offset + 1, with guards to not overflow the size of u32.
///
/// pprof does not allow a location or function with an id of zero, even if
/// it's the first item in the collection.
#[inline]
pub fn small_non_zero_pprof_id(offset: usize) -> Option<NonZeroU32> {
    let small: u32 = offset.try_into().ok()?;
    let non_zero = small.checked_add(1)?;
    NonZeroU32::new(non_zero)
}

/// Checks that an offset handed out by an index collection of length `len`
/// can become a pprof id, and converts it.
pub fn checked_id_from_offset<I: Id>(offset: usize, len: usize) -> anyhow::Result<I> {
    anyhow::ensure!(
        offset < len,
        "out of bounds id generated {:?}, len was {:?}",
        offset,
        len
    );
    small_non_zero_pprof_id(offset).with_context(|| format!("invalid id generated {:?}", offset))?;
    Ok(I::from_offset(offset))
}

pub trait Dedup<T: Item> {
    /// Deduplicate the Item, and check if the generated Id is valid.
    fn checked_dedup(&mut self, item: T) -> anyhow::Result<<T as Item>::Id>;
}

impl<T: Item> Dedup<T> for FxIndexSet<T> {
    fn checked_dedup(&mut self, item: T) -> anyhow::Result<<T as Item>::Id> {
        let (id, _) = self.insert_full(item);
        checked_id_from_offset(id, self.len())
    }
}

pub fn into_pprof_iter<T: PprofItem>(
    collection: FxIndexSet<T>,
) -> impl Iterator<Item = T::PprofMessage> {
    collection
        .into_iter()
        .enumerate()
        .map(|(index, item)| item.to_pprof(<T as Item>::Id::from_offset(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_non_zero_pprof_id() {
        assert_eq!(NonZeroU32::new(1), small_non_zero_pprof_id(0));
        assert_eq!(NonZeroU32::new(2), small_non_zero_pprof_id(1));
        assert_eq!(
            NonZeroU32::new(u32::MAX),
            small_non_zero_pprof_id((u32::MAX - 1) as usize)
        );

        assert_eq!(None, small_non_zero_pprof_id(u32::MAX as usize));
        assert_eq!(None, small_non_zero_pprof_id(usize::MAX));
    }

    #[test]
    fn checked_id_rejects_out_of_bounds_offsets() {
        let ok: anyhow::Result<StringId> = checked_id_from_offset(2, 3);
        assert_eq!(2, ok.unwrap().to_raw_id());

        let err: anyhow::Result<StringId> = checked_id_from_offset(3, 3);
        assert!(err.is_err());
    }
}
