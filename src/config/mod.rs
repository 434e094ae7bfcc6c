//! Configuration knobs for the circulator core and for individual runners,
//! with sensible defaults and a fluent builder.

mod circulator_config;
mod runner_config;

pub use circulator_config::{CirculatorConfig, CirculatorConfigBuilder};
pub use runner_config::{RunnerConfig, RunnerConfigBuilder};
