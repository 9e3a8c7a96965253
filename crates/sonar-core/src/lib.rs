//! # sonar-core
//!
//! Root presentation arbiter for the sonar proximity app.
//!
//! The arbiter decides which flow is mounted at the root (onboarding or the
//! main status flow) and whether a single blocking remediation overlay is shown
//! because the proximity radio is off or a permission was denied.
//!
//! ## Architecture
//!
//! - [`types`] - Root content, remediation kinds, permission and radio states
//! - [`collaborators`] - Traits for the injected permission, radio,
//!   registration, onboarding, lifecycle, and presentation collaborators
//! - [`memory`] - In-memory collaborators for hosts and tests
//! - [`arbiter`] - The synchronous decision state machine
//! - [`runtime`] - Serial tokio event loop that feeds triggers to the arbiter
//! - [`navigation`] - Main-flow screens
//! - [`config`] - Layered configuration
//! - [`error`] - Unified error types for the crate

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod arbiter;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod memory;
pub mod navigation;
pub mod runtime;
pub mod types;

// Re-export primary types for convenience
pub use arbiter::{Decision, PresentationArbiter};
pub use collaborators::{
    LifecycleEvent, LifecycleSignal, OnboardingGate, PermissionStatusSource, PresentationSink,
    RadioPowerObserver, RegistrationStore,
};
pub use config::{
    default_config_path, ArbiterConfig, ConfigError, ConfigResult, FeatureFlags,
    RemediationPolicy, RuntimeConfig, ServerConfig,
};
pub use error::{Result, SonarError};
pub use memory::{
    MemoryLifecycle, MemoryOnboarding, MemoryPermissions, MemoryRadio, MemoryRegistration,
    MemorySink, PresentationCommand, PresentationState,
};
pub use navigation::{check_symptoms_target, Screen};
pub use runtime::{ArbiterHandle, ArbiterRuntime, ArbiterStatus, Collaborators};
pub use types::{
    DecisionToken, PermissionSnapshot, PermissionState, RadioPower, RemediationKind, RootContent,
};
