// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// Offset of a string in the profile's string table. Unlike location and
/// function ids, zero is valid and always refers to the empty string.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StringId(u32);

impl StringId {
    pub const ZERO: StringId = StringId(0);
}

impl Id for StringId {
    type RawId = i64;

    fn from_offset(inner: usize) -> Self {
        #[allow(clippy::expect_used)]
        let index: u32 = inner.try_into().expect("StringId to fit into a u32");
        Self(index)
    }

    fn to_raw_id(&self) -> Self::RawId {
        Self::RawId::from(self.0)
    }
}
