// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{Function, Location, Profile, Sample};

pub fn sorted_samples(profile: &Profile) -> Vec<Sample> {
    let mut samples = profile.samples.clone();
    samples.sort_unstable();
    samples
}

#[track_caller]
pub fn string_table_fetch(profile: &Profile, id: i64) -> &String {
    profile
        .string_table
        .get(id as usize)
        .unwrap_or_else(|| panic!("String {id} not found"))
}

#[track_caller]
pub fn location_fetch(profile: &Profile, id: u64) -> &Location {
    profile
        .locations
        .iter()
        .find(|location| location.id == id)
        .unwrap_or_else(|| panic!("Location {id} not found"))
}

#[track_caller]
pub fn function_fetch(profile: &Profile, id: u64) -> &Function {
    profile
        .functions
        .iter()
        .find(|function| function.id == id)
        .unwrap_or_else(|| panic!("Function {id} not found"))
}

/// Resolves the name of the function behind a location's (only) line.
#[track_caller]
pub fn location_function_name(profile: &Profile, location_id: u64) -> &str {
    let location = location_fetch(profile, location_id);
    let line = location
        .lines
        .first()
        .unwrap_or_else(|| panic!("Location {location_id} has no lines"));
    let function = function_fetch(profile, line.function_id);
    string_table_fetch(profile, function.name)
}
