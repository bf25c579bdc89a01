// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0


use super::*;
use crate::api::{
    self, BuilderConfig, CallFrame, MethodResolver, NativeFrameCache, ProfileKind,
    ProfileStackTrace, StackFrameElements,
};
use crate::symbols::{fix_method_parameters, has_signature_error, simplify_function_name};
use tracing::{debug, trace, warn};

/// Display name of Java frames whose method identity was not captured.
pub const UNKNOWN_METHOD: &str = "Unknown method";

/// Aggregates batches of captured stacks into one pprof profile.
///
/// A builder covers one output window. It is owned by a single thread, and
/// consumed when the profile is created, so it cannot be reused afterwards.
pub struct ProfileBuilder<R, N> {
    method_resolver: R,
    native_cache: N,
    /// In the metric's unit; 0 and 1 disable unsampling.
    sampling_rate: i64,
    unsample_by_default: bool,
    skipped_top_native_frames: usize,
    sample_types: [pprof::ValueType; 2],
    period_type: pprof::ValueType,
    locations: LocationBuilder,
    trace_samples: TraceSamples,
    samples: Vec<Sample>,
}

/// Public API
impl<R: MethodResolver, N: NativeFrameCache> ProfileBuilder<R, N> {
    /// Creates a builder with a count series and a metric series; the metric
    /// series is also the period type.
    pub fn new(
        count_type: api::ValueType,
        metric_type: api::ValueType,
        sampling_rate: i64,
        method_resolver: R,
        native_cache: N,
    ) -> Self {
        let mut locations = LocationBuilder::new();
        let mut intern_value_type = |value_type: api::ValueType| pprof::ValueType {
            r#type: locations.intern(value_type.r#type).to_raw_id(),
            unit: locations.intern(value_type.unit).to_raw_id(),
        };
        let count = intern_value_type(count_type);
        let metric = intern_value_type(metric_type);

        Self {
            method_resolver,
            native_cache,
            sampling_rate,
            unsample_by_default: false,
            skipped_top_native_frames: 0,
            sample_types: [count, metric],
            period_type: metric,
            locations,
            trace_samples: TraceSamples::default(),
            samples: Vec::new(),
        }
    }

    pub fn from_kind(
        kind: ProfileKind,
        sampling_rate: i64,
        method_resolver: R,
        native_cache: N,
    ) -> Self {
        let mut builder = Self::new(
            kind.count_type(),
            kind.metric_type(),
            sampling_rate,
            method_resolver,
            native_cache,
        )
        .with_skipped_top_native_frames(kind.skipped_top_native_frames());
        builder.unsample_by_default = kind.unsample();
        builder
    }

    pub fn from_config(config: BuilderConfig, method_resolver: R, native_cache: N) -> Self {
        Self::from_kind(
            config.kind,
            config.sampling_rate,
            method_resolver,
            native_cache,
        )
    }

    pub fn for_cpu(sampling_rate: i64, method_resolver: R, native_cache: N) -> Self {
        Self::from_kind(ProfileKind::Cpu, sampling_rate, method_resolver, native_cache)
    }

    pub fn for_heap(sampling_rate: i64, method_resolver: R, native_cache: N) -> Self {
        Self::from_kind(ProfileKind::Heap, sampling_rate, method_resolver, native_cache)
    }

    pub fn for_contention(sampling_rate: i64, method_resolver: R, native_cache: N) -> Self {
        Self::from_kind(
            ProfileKind::Contention,
            sampling_rate,
            method_resolver,
            native_cache,
        )
    }

    /// Sets how many leading native frames of every stack belong to the
    /// capture mechanism. Only native frames are ever trimmed.
    pub fn with_skipped_top_native_frames(mut self, frames: usize) -> Self {
        self.skipped_top_native_frames = frames;
        self
    }

    /// Adds a batch of stacks, each seen once.
    pub fn add_traces(&mut self, traces: &[ProfileStackTrace]) -> anyhow::Result<()> {
        self.native_cache.process_traces(traces);
        debug!(traces = traces.len(), "Adding batch of stack traces");

        for trace in traces {
            self.add_trace(trace, 1)?;
        }
        Ok(())
    }

    /// Adds a batch of stacks, `counts[i]` being how many times `traces[i]`
    /// was seen.
    pub fn add_traces_with_counts(
        &mut self,
        traces: &[ProfileStackTrace],
        counts: &[i64],
    ) -> anyhow::Result<()> {
        anyhow::ensure!(
            traces.len() == counts.len(),
            "expected {} counts, one per trace, but got {}",
            traces.len(),
            counts.len(),
        );

        self.native_cache.process_traces(traces);
        debug!(traces = traces.len(), "Adding batch of counted stack traces");

        for (trace, count) in traces.iter().zip(counts) {
            self.add_trace(trace, *count)?;
        }
        Ok(())
    }

    /// Adds a sample not coming from a captured stack, e.g. to account for
    /// dropped samples. Its single location is named `name`.
    pub fn add_artificial_trace(
        &mut self,
        name: &str,
        count: i64,
        sampling_rate: i64,
    ) -> anyhow::Result<()> {
        let location = self.locations.location_for(name, name, "", -1)?;
        self.samples.push(Sample::new(
            vec![location],
            count,
            count.saturating_mul(sampling_rate),
        ));
        Ok(())
    }

    /// Creates the profile. With `unsample`, each sample's values are scaled
    /// by the sampling ratio computed from its own count and metric.
    pub fn finalize(mut self, unsample: bool) -> pprof::Profile {
        if unsample {
            self.unsample_metrics();
        }

        let samples: Vec<pprof::Sample> = self.samples.iter().map(pprof::Sample::from).collect();
        let (locations, functions, string_table) = self.locations.into_pprof();
        debug!(
            samples = samples.len(),
            locations = locations.len(),
            functions = functions.len(),
            unsample,
            "Finalized profile"
        );

        pprof::Profile {
            sample_types: self.sample_types.to_vec(),
            samples,
            locations,
            functions,
            string_table,
            period_type: Some(self.period_type),
            ..Default::default()
        }
    }

    pub fn create_sampled_proto(self) -> pprof::Profile {
        self.finalize(false)
    }

    pub fn create_unsampled_proto(self) -> pprof::Profile {
        self.finalize(true)
    }

    /// Creates the profile with the unsampling policy of the builder's kind:
    /// heap profiles are unsampled, the others are not.
    pub fn create_proto(self) -> pprof::Profile {
        let unsample = self.unsample_by_default;
        self.finalize(unsample)
    }
}

/// Private helper functions
impl<R: MethodResolver, N: NativeFrameCache> ProfileBuilder<R, N> {
    fn add_trace(&mut self, trace: &ProfileStackTrace, count: i64) -> anyhow::Result<()> {
        if let Some(sample) = self.trace_samples.sample_for(trace.frames) {
            trace!(sample = sample.to_offset(), "Merging stack trace");
            self.samples[sample.to_offset()].accumulate(count, trace.metric_value);
            return Ok(());
        }

        // Nothing interned for a failing trace survives it, and addresses are
        // only stamped once every frame resolved.
        let checkpoint = self.locations.checkpoint();
        let (locations, addresses) = match self.add_frames(trace.frames) {
            Ok(walked) => walked,
            Err(err) => {
                self.locations.rollback(checkpoint);
                return Err(err);
            }
        };
        for (location, address) in addresses {
            self.locations.set_address(location, address)?;
        }

        let sample = SampleId::from_offset(self.samples.len());
        self.samples
            .push(Sample::new(locations, count, trace.metric_value));
        self.trace_samples.add(trace.frames, sample);
        Ok(())
    }

    /// Resolves the kept frames, leaf first, along with the address of each
    /// kept native frame.
    fn add_frames(
        &mut self,
        frames: &[CallFrame],
    ) -> anyhow::Result<(Vec<LocationId>, Vec<(LocationId, u64)>)> {
        let first_frame = self.skip_top_native_frames(frames);
        let mut locations = Vec::with_capacity(frames.len() - first_frame);
        let mut addresses = Vec::new();
        let mut stack_state = StackState::new();

        for frame in &frames[first_frame..] {
            if frame.is_native() {
                if let Some(location) = self.add_native_frame(frame, &mut stack_state)? {
                    addresses.push((location, frame.native_address()));
                    locations.push(location);
                }
            } else {
                locations.push(self.add_java_frame(frame, &mut stack_state)?);
            }
        }
        Ok((locations, addresses))
    }

    fn skip_top_native_frames(&self, frames: &[CallFrame]) -> usize {
        frames
            .iter()
            .take(self.skipped_top_native_frames)
            .take_while(|frame| frame.is_native())
            .count()
    }

    fn add_java_frame(
        &mut self,
        frame: &CallFrame,
        stack_state: &mut StackState,
    ) -> anyhow::Result<LocationId> {
        stack_state.java_frame();

        let Some(method_id) = frame.method_id else {
            return self.locations.location_for("", UNKNOWN_METHOD, "", 0);
        };

        let StackFrameElements {
            file_name,
            class_name,
            method_name,
            mut signature,
            line_number,
        } = self.method_resolver.frame_elements(method_id, frame.lineno);

        fix_method_parameters(&mut signature);
        if has_signature_error(&signature) {
            warn!(
                %class_name,
                %method_name,
                %signature,
                "Could not fully parse method signature"
            );
        }

        let mut full_method_name = simplify_function_name(&format!("{class_name}.{method_name}"));
        full_method_name.push_str(&signature);

        self.locations
            .location_for(&class_name, &full_method_name, &file_name, line_number)
    }

    fn add_native_frame(
        &mut self,
        frame: &CallFrame,
        stack_state: &mut StackState,
    ) -> anyhow::Result<Option<LocationId>> {
        let function_name = self.native_cache.function_name(frame);
        let location = self.native_cache.location(frame, &mut self.locations)?;

        anyhow::ensure!(
            self.locations.get(location).is_some(),
            "native frame cache returned unknown location {location:?}"
        );

        stack_state.native_frame(&function_name);
        if stack_state.skip_frame() {
            return Ok(None);
        }
        Ok(Some(location))
    }

    fn unsample_metrics(&mut self) {
        for sample in self.samples.iter_mut() {
            sample.unsample(self.sampling_rate);
        }
    }
}
