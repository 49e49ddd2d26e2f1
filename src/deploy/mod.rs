//! Container build and Kubernetes rollout as an ordered pipeline of steps.
//!
//! Each [`Step`] shells out to an external tool through a [`CommandRunner`]
//! and either succeeds or returns a [`StepError`]. [`Pipeline::run`] executes
//! the steps in order and stops at the first failure.

pub mod config;
pub mod pipeline;
pub mod runner;

pub use self::config::{DeployConfig, MANIFESTS};
pub use self::pipeline::{Pipeline, Report, Step, StepError};
pub use self::runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
