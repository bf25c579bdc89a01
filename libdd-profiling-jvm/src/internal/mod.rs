// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod function;
mod location;
mod profile;
mod sample;
mod stack_state;
mod trace_samples;
mod upscaling;

pub use function::*;
pub use location::*;
pub use profile::*;
pub use sample::*;
pub use stack_state::*;
pub use trace_samples::*;
pub use upscaling::*;

use crate::collections::identifiable::*;
use crate::pprof;
use std::num::NonZeroU32;
