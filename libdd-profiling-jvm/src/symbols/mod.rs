// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Rendering of JVM names into the form shown in profiles.

mod signature;
mod simplify;

pub use signature::*;
pub use simplify::*;
