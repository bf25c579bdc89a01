// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum FrameRun {
    #[default]
    Initial,
    /// Inside consecutive native frames, the last one having this name.
    Native(String),
    Java,
}

/// Tracks the frames seen so far while walking one stack, to drop native
/// frames that repeat the name of the native frame right before them. Those
/// are stub or dispatch frames of a single logical call.
///
/// Only immediately consecutive frames are compared: native `A`, Java,
/// native `A` keeps both native frames.
#[derive(Debug, Default)]
pub struct StackState {
    run: FrameRun,
    skip: bool,
}

impl StackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn java_frame(&mut self) {
        self.run = FrameRun::Java;
        self.skip = false;
    }

    pub fn native_frame(&mut self, function_name: &str) {
        match &self.run {
            FrameRun::Native(current) if current == function_name => self.skip = true,
            _ => {
                self.run = FrameRun::Native(function_name.to_owned());
                self.skip = false;
            }
        }
    }

    /// Whether the frame last reported should be left out of the sample.
    pub fn skip_frame(&self) -> bool {
        self.skip
    }
}
