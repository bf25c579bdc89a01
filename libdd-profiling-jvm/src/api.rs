// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::internal::{LocationBuilder, LocationId};
use serde::Deserialize;
use std::num::NonZeroU64;

/// Line number the capture mechanism uses to mark a native frame. For those
/// frames, the frame's method id holds the native function pointer instead
/// of a method identity.
pub const NATIVE_FRAME_LINE_NUMBER: i32 = -99;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ValueType<'a> {
    pub r#type: &'a str,
    pub unit: &'a str,
}

impl<'a> ValueType<'a> {
    #[inline(always)]
    pub fn new(r#type: &'a str, unit: &'a str) -> Self {
        Self { r#type, unit }
    }
}

/// Opaque identity of a JVM method, as handed out by the capture mechanism.
/// It is only ever compared and hashed, never dereferenced.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MethodId(NonZeroU64);

impl MethodId {
    /// Returns None for the null identity.
    #[inline]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// One raw frame of a captured stack.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(C)]
pub struct CallFrame {
    /// Line number of a Java frame, or [NATIVE_FRAME_LINE_NUMBER].
    pub lineno: i32,
    pub method_id: Option<MethodId>,
}

impl CallFrame {
    pub fn java(method_id: Option<MethodId>, lineno: i32) -> Self {
        Self { lineno, method_id }
    }

    pub fn native(function_address: u64) -> Self {
        Self {
            lineno: NATIVE_FRAME_LINE_NUMBER,
            method_id: MethodId::new(function_address),
        }
    }

    #[inline]
    pub fn is_native(&self) -> bool {
        self.lineno == NATIVE_FRAME_LINE_NUMBER
    }

    /// The native function pointer of a native frame, zero when absent.
    #[inline]
    pub fn native_address(&self) -> u64 {
        self.method_id.map_or(0, MethodId::get)
    }
}

/// A captured stack, leaf first, along with the metric it is charged with
/// (allocated bytes, cpu time, contention delay, ...).
#[derive(Copy, Clone, Debug)]
pub struct ProfileStackTrace<'a> {
    pub frames: &'a [CallFrame],
    pub metric_value: i64,
}

impl<'a> ProfileStackTrace<'a> {
    pub fn new(frames: &'a [CallFrame], metric_value: i64) -> Self {
        Self {
            frames,
            metric_value,
        }
    }
}

/// What the managed symbolizer knows about a Java frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StackFrameElements {
    pub file_name: String,
    /// Fully qualified, dot separated, e.g. `java.lang.Thread`.
    pub class_name: String,
    pub method_name: String,
    /// JVM method descriptor, e.g. `(I[Ljava/lang/String;)V`.
    pub signature: String,
    pub line_number: i32,
}

/// Resolves a Java frame's method identity into names.
pub trait MethodResolver {
    fn frame_elements(&self, method_id: MethodId, lineno: i32) -> StackFrameElements;
}

/// Resolves native frames. Implementations usually cache symbols across
/// batches and deduplicate the locations they hand out.
pub trait NativeFrameCache {
    /// Called with each whole batch before any of its traces is processed.
    fn process_traces(&mut self, traces: &[ProfileStackTrace<'_>]);

    fn function_name(&mut self, frame: &CallFrame) -> String;

    fn location(
        &mut self,
        frame: &CallFrame,
        locations: &mut LocationBuilder,
    ) -> anyhow::Result<LocationId>;
}

impl<T: MethodResolver + ?Sized> MethodResolver for &T {
    fn frame_elements(&self, method_id: MethodId, lineno: i32) -> StackFrameElements {
        (**self).frame_elements(method_id, lineno)
    }
}

impl<T: NativeFrameCache + ?Sized> NativeFrameCache for &mut T {
    fn process_traces(&mut self, traces: &[ProfileStackTrace<'_>]) {
        (**self).process_traces(traces)
    }

    fn function_name(&mut self, frame: &CallFrame) -> String {
        (**self).function_name(frame)
    }

    fn location(
        &mut self,
        frame: &CallFrame,
        locations: &mut LocationBuilder,
    ) -> anyhow::Result<LocationId> {
        (**self).location(frame, locations)
    }
}

/// The three flavors of JVM profiles. They differ only in their value types,
/// whether values are unsampled on output, and how many leading native frames
/// belong to the capture mechanism itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Cpu,
    Heap,
    Contention,
}

impl ProfileKind {
    pub fn count_type(self) -> ValueType<'static> {
        match self {
            ProfileKind::Cpu => ValueType::new("samples", "count"),
            ProfileKind::Heap => ValueType::new("inuse_objects", "count"),
            ProfileKind::Contention => ValueType::new("contentions", "count"),
        }
    }

    pub fn metric_type(self) -> ValueType<'static> {
        match self {
            ProfileKind::Cpu => ValueType::new("cpu", "nanoseconds"),
            ProfileKind::Heap => ValueType::new("inuse_space", "bytes"),
            ProfileKind::Contention => ValueType::new("delay", "microseconds"),
        }
    }

    /// Heap samples are taken every `sampling_rate` bytes on average, so small
    /// allocation sites are underrepresented unless unsampled.
    pub fn unsample(self) -> bool {
        matches!(self, ProfileKind::Heap)
    }

    /// CPU stacks are captured from a signal handler: the handler and the
    /// signal trampoline sit on top of every native stack.
    pub fn skipped_top_native_frames(self) -> usize {
        match self {
            ProfileKind::Cpu => 2,
            ProfileKind::Heap | ProfileKind::Contention => 0,
        }
    }
}

/// Construction-time configuration of a builder.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct BuilderConfig {
    pub kind: ProfileKind,
    /// In the metric's unit. 0 and 1 disable unsampling.
    #[serde(default)]
    pub sampling_rate: i64,
}
