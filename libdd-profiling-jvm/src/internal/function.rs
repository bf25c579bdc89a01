// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// The function behind a location: a rendered display name and the source
/// file it comes from. Every line of a method shares one function.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Function {
    pub name: StringId,
    pub filename: StringId,
}

impl Item for Function {
    type Id = FunctionId;
}

impl PprofItem for Function {
    type PprofMessage = pprof::Function;

    /// JVM frames carry neither a mangled name nor a start line, so those
    /// are left empty.
    fn to_pprof(&self, id: Self::Id) -> Self::PprofMessage {
        pprof::Function {
            id: id.to_raw_id(),
            name: self.name.to_raw_id(),
            system_name: StringId::ZERO.to_raw_id(),
            filename: self.filename.to_raw_id(),
            start_line: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FunctionId(NonZeroU32);

impl Id for FunctionId {
    type RawId = u64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("FunctionId to fit into a u32"))
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.get().into()
    }
}
