#![deny(missing_docs, clippy::all, clippy::pedantic)]
#![doc = include_str!("../README.md")]

mod lock;
pub use lock::Lock;

#[cfg(not(feature = "loom"))]
mod lock_api;
#[cfg(not(feature = "loom"))]
pub use lock_api::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod config;
mod keyed_event;
mod opcode;
mod wait_queue;

#[cfg(test)]
mod tests;
