//! # Singleton Catalog
//!
//! One lazy singleton provider, guarded four different ways:
//!
//! - **Unsynchronized**: check-then-construct with no exclusion. Concurrent
//!   callers can each build an instance; kept as the negative example.
//! - **Synchronized**: the whole accessor runs under one mutex.
//! - **Double-checked locking**: an acquire load on the fast path, the
//!   mutex only while the instance is missing.
//! - **Eager**: built by the composition root before any caller exists.
//!
//! Providers are collected in an explicit [`Registry`] built in `main`
//! instead of living in statics.
//!
//! Run the comparison with:
//! ```bash
//! cargo run --bin singleton_demo
//! LOG=debug cargo run --bin singleton_demo -- demo.toml
//! ```

pub mod config;
pub mod delay;
pub mod driver;
pub mod error;
pub mod holder;
pub mod logger;
pub mod registry;
pub mod resource;
pub mod state;
pub mod strategy;

pub use config::{DemoConfig, OutputFormat};
pub use delay::{CancelHandle, CancelTimer, CancelToken, ConstructionDelay};
pub use driver::{run_concurrent, run_concurrent_with, Observation, RunReport};
pub use error::{ConfigError, SingletonError};
pub use holder::{CreationCounter, InstanceHolder};
pub use registry::{Registry, RegistryBuilder};
pub use resource::Resource;
pub use state::GuardState;
pub use strategy::{provider, Accessor, Constructor, Strategy};
