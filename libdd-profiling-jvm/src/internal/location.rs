// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::collections::string_table::StringTable;
use indexmap::Equivalent;

/// Represents a [pprof::Location] with some space-saving changes:
///  - The id is not stored on the struct. It's stored in the container that holds the struct.
///  - ids for linked objects use 32-bit numbers instead of 64 bit ones.
///  - we always use 1 Line per Location, so this is directly inlined into the struct.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub function_id: FunctionId,
    /// Only set on native frames.
    pub address: u64,
    pub line: i64,
}

impl Item for Location {
    type Id = LocationId;
}

impl PprofItem for Location {
    type PprofMessage = pprof::Location;

    fn to_pprof(&self, id: Self::Id) -> Self::PprofMessage {
        pprof::Location {
            id: id.to_raw_id(),
            mapping_id: 0,
            address: self.address,
            lines: vec![pprof::Line {
                function_id: self.function_id.to_raw_id(),
                line: self.line,
            }],
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LocationId(NonZeroU32);

impl LocationId {
    #[inline]
    pub fn to_offset(&self) -> usize {
        self.0.get() as usize - 1
    }
}

impl Id for LocationId {
    type RawId = u64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("LocationId to fit into a u32"))
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.get().into()
    }
}

/// Rendered identity of a frame. Two frames rendering to the same key share
/// a location for the whole life of the builder.
#[derive(Debug, Eq, PartialEq, Hash)]
struct LocationKey {
    class_name: Box<str>,
    function_name: Box<str>,
    file_name: Box<str>,
    line_number: i32,
}

/// Borrowed form of [LocationKey], used for lookups so that hits don't
/// allocate. Field order and types must hash exactly like [LocationKey].
#[derive(Hash)]
struct LocationKeyRef<'a> {
    class_name: &'a str,
    function_name: &'a str,
    file_name: &'a str,
    line_number: i32,
}

impl Equivalent<LocationKey> for LocationKeyRef<'_> {
    fn equivalent(&self, key: &LocationKey) -> bool {
        self.line_number == key.line_number
            && self.class_name == &*key.class_name
            && self.function_name == &*key.function_name
            && self.file_name == &*key.file_name
    }
}

impl From<&LocationKeyRef<'_>> for LocationKey {
    fn from(key: &LocationKeyRef<'_>) -> Self {
        Self {
            class_name: key.class_name.into(),
            function_name: key.function_name.into(),
            file_name: key.file_name.into(),
            line_number: key.line_number,
        }
    }
}

/// Sizes of a [LocationBuilder]'s tables at some point in time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LocationCheckpoint {
    strings: usize,
    functions: usize,
    locations: usize,
}

/// Interns locations and the functions and strings they reference. Location
/// ids are dense and start at 1, in order of first use.
#[derive(Default)]
pub struct LocationBuilder {
    strings: StringTable,
    functions: FxIndexSet<Function>,
    locations: FxIndexMap<LocationKey, Location>,
}

impl LocationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        self.strings.intern(s)
    }

    /// Returns the location for the rendered frame, creating it and its
    /// function on first use.
    pub fn location_for(
        &mut self,
        class_name: &str,
        function_name: &str,
        file_name: &str,
        line_number: i32,
    ) -> anyhow::Result<LocationId> {
        let key = LocationKeyRef {
            class_name,
            function_name,
            file_name,
            line_number,
        };
        if let Some(offset) = self.locations.get_index_of(&key) {
            return Ok(LocationId::from_offset(offset));
        }

        let name = self.strings.intern(function_name);
        let filename = self.strings.intern(file_name);
        let function_id = self.functions.checked_dedup(Function { name, filename })?;

        let (offset, _) = self.locations.insert_full(
            LocationKey::from(&key),
            Location {
                function_id,
                address: 0,
                line: line_number.into(),
            },
        );
        checked_id_from_offset(offset, self.locations.len())
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations
            .get_index(id.to_offset())
            .map(|(_, location)| location)
    }

    /// Records the instruction address of a native frame's location.
    pub fn set_address(&mut self, id: LocationId, address: u64) -> anyhow::Result<()> {
        let len = self.locations.len();
        let (_, location) = self
            .locations
            .get_index_mut(id.to_offset())
            .ok_or_else(|| anyhow::anyhow!("unknown location id {id:?}, len was {len}"))?;
        location.address = address;
        Ok(())
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Captures the current sizes, so that everything interned afterwards can
    /// be dropped again with [LocationBuilder::rollback].
    pub fn checkpoint(&self) -> LocationCheckpoint {
        LocationCheckpoint {
            strings: self.strings.len(),
            functions: self.functions.len(),
            locations: self.locations.len(),
        }
    }

    /// Forgets the strings, functions and locations interned since
    /// `checkpoint` was taken. Ids handed out before it stay valid.
    pub fn rollback(&mut self, checkpoint: LocationCheckpoint) {
        self.locations.truncate(checkpoint.locations);
        self.functions.truncate(checkpoint.functions);
        self.strings.truncate(checkpoint.strings);
    }

    /// Splits the builder into pprof locations, functions and string table.
    pub fn into_pprof(self) -> (Vec<pprof::Location>, Vec<pprof::Function>, Vec<String>) {
        let locations = self
            .locations
            .into_values()
            .enumerate()
            .map(|(offset, location)| location.to_pprof(LocationId::from_offset(offset)))
            .collect();
        let functions = into_pprof_iter(self.functions).collect();
        (locations, functions, self.strings.into_pprof_strings())
    }
}
