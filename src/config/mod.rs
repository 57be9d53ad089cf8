// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;
pub mod literal;
pub mod params;
pub mod registry;

pub use loader::{
    load_and_validate_pipeline_config, load_library, load_pipeline_config, parse_library,
    parse_pipeline_config, ConfigFormat, LibraryConfig, MainSection, PipelineConfig,
    StageSection,
};
pub use registry::{Registry, StageDescriptor};
pub use runtime::RuntimeBuilder;
pub use validation::{collect_problems, validate_pipeline_config};
