#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod cache;
pub mod configuration;

pub use cache::{Cache, CacheType, Error, MaybeAsync, RemoteHandle, Scheduler, Snapshot, Value};
