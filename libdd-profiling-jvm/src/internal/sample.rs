// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;

/// Offset of the occurrence count in [Sample::values].
pub const COUNT_OFFSET: usize = 0;
/// Offset of the metric total in [Sample::values].
pub const METRIC_OFFSET: usize = 1;

/// One distinct call stack with its accumulated values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    /// The leaf is at locations[0].
    pub locations: Vec<LocationId>,
    /// Aligned with the builder's sample types: count, then metric.
    pub values: [i64; 2],
}

impl Sample {
    pub fn new(locations: Vec<LocationId>, count: i64, metric_value: i64) -> Self {
        Self {
            locations,
            values: [count, metric_value],
        }
    }

    /// Folds one more occurrence of the same raw stack into this sample.
    pub fn accumulate(&mut self, count: i64, metric_value: i64) {
        self.values[COUNT_OFFSET] = self.values[COUNT_OFFSET].saturating_add(count);
        self.values[METRIC_OFFSET] = self.values[METRIC_OFFSET].saturating_add(metric_value);
    }

    /// Rescales both values with the ratio computed from this sample's own
    /// count and metric. Scaled values are truncated toward zero.
    pub fn unsample(&mut self, sampling_rate: i64) {
        let ratio = calculate_sampling_ratio(
            sampling_rate,
            self.values[COUNT_OFFSET],
            self.values[METRIC_OFFSET],
        );
        for value in self.values.iter_mut() {
            *value = (*value as f64 * ratio) as i64;
        }
    }
}

impl From<&Sample> for pprof::Sample {
    fn from(sample: &Sample) -> Self {
        pprof::Sample {
            location_ids: sample.locations.iter().map(Id::to_raw_id).collect(),
            values: sample.values.to_vec(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct SampleId(u32);

impl SampleId {
    #[inline]
    pub fn to_offset(&self) -> usize {
        self.0 as usize
    }
}

impl Id for SampleId {
    type RawId = usize;

    fn from_offset(inner: usize) -> Self {
        #[allow(clippy::expect_used)]
        let index: u32 = inner.try_into().expect("SampleId to fit into a u32");
        Self(index)
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0 as Self::RawId
    }
}
