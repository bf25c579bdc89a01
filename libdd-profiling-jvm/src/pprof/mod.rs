// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod proto;
mod test_utils;

pub use proto::*;
pub use test_utils::*;
