// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::api::CallFrame;
use std::borrow::Borrow;

/// Raw identity of a captured stack: its (method id, line) pairs, verbatim.
/// The frames are copied out of the capture buffer, which does not outlive
/// the batch.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct TraceKey(Box<[CallFrame]>);

impl Borrow<[CallFrame]> for TraceKey {
    fn borrow(&self) -> &[CallFrame] {
        &self.0
    }
}

impl From<&[CallFrame]> for TraceKey {
    fn from(frames: &[CallFrame]) -> Self {
        Self(frames.into())
    }
}

/// Maps raw stacks to the sample aggregating them. Matching never looks at
/// rendered names, so identical captures merge before anything is resolved,
/// and captures differing in a single frame's method or line never merge.
#[derive(Default)]
pub struct TraceSamples {
    traces: FxIndexMap<TraceKey, SampleId>,
}

impl TraceSamples {
    pub fn sample_for(&self, frames: &[CallFrame]) -> Option<SampleId> {
        self.traces.get(frames).copied()
    }

    pub fn add(&mut self, frames: &[CallFrame], sample: SampleId) {
        self.traces.insert(TraceKey::from(frames), sample);
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.traces.len()
    }
}
