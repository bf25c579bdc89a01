// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use libdd_profiling_jvm::api::{
    CallFrame, MethodId, MethodResolver, NativeFrameCache, ProfileStackTrace, StackFrameElements,
};
use libdd_profiling_jvm::internal::{LocationBuilder, LocationId};
use std::collections::HashMap;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Resolves methods from a fixed table, the way a JVMTI-backed resolver
/// would after looking up the method's class and line table.
#[derive(Default)]
pub struct TableResolver {
    methods: HashMap<u64, StackFrameElements>,
}

impl TableResolver {
    pub fn method(mut self, id: u64, class: &str, method: &str, signature: &str) -> Self {
        let simple_name = class.rsplit('.').next().unwrap_or(class);
        self.methods.insert(
            id,
            StackFrameElements {
                file_name: format!("{simple_name}.java"),
                class_name: class.to_owned(),
                method_name: method.to_owned(),
                signature: signature.to_owned(),
                line_number: 0,
            },
        );
        self
    }
}

impl MethodResolver for TableResolver {
    fn frame_elements(&self, method_id: MethodId, lineno: i32) -> StackFrameElements {
        let mut elements = self
            .methods
            .get(&method_id.get())
            .cloned()
            .unwrap_or_default();
        // The captured "line" of a Java frame is resolved to a source line;
        // here they are the same.
        elements.line_number = lineno;
        elements
    }
}

/// Caches native symbols across batches and hands out one location per
/// symbol name.
#[derive(Default)]
pub struct SymbolCache {
    symbols: HashMap<u64, String>,
    pub batches_seen: usize,
    pub frames_seen: usize,
}

impl SymbolCache {
    pub fn symbol(mut self, address: u64, name: &str) -> Self {
        self.symbols.insert(address, name.to_owned());
        self
    }
}

impl NativeFrameCache for SymbolCache {
    fn process_traces(&mut self, traces: &[ProfileStackTrace<'_>]) {
        self.batches_seen += 1;
        self.frames_seen += traces
            .iter()
            .flat_map(|trace| trace.frames)
            .filter(|frame| frame.is_native())
            .count();
    }

    fn function_name(&mut self, frame: &CallFrame) -> String {
        match self.symbols.get(&frame.native_address()) {
            Some(name) => name.clone(),
            None => format!("{:#x}", frame.native_address()),
        }
    }

    fn location(
        &mut self,
        frame: &CallFrame,
        locations: &mut LocationBuilder,
    ) -> anyhow::Result<LocationId> {
        let name = self.function_name(frame);
        locations.location_for("", &name, "", 0)
    }
}

pub fn java(method: u64, line: i32) -> CallFrame {
    CallFrame::java(MethodId::new(method), line)
}
