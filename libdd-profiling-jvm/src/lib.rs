// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns raw, possibly repeated JVM call-stack captures into a deduplicated
//! pprof object graph (sample types, locations, functions and samples).
//!
//! The entry point is [internal::ProfileBuilder]. Capturing stacks,
//! resolving method identities and encoding the result are left to the
//! caller through the [api::MethodResolver] and [api::NativeFrameCache]
//! traits.

pub mod api;
pub mod collections;
pub mod internal;
pub mod pprof;
pub mod symbols;
