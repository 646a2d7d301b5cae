#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod cuckoo;

/// Errors reported by table construction and growth.
pub mod error;

pub mod hash;
pub mod hash_table;
pub mod robin;
#[cfg(any(test, feature = "stats"))]
pub mod stats;

pub use config::CuckooConfig;
pub use config::EvictionLimit;
pub use config::RobinConfig;
pub use cuckoo::CuckooTable;
#[cfg(any(test, feature = "stats"))]
pub use error::InvariantViolation;
pub use error::ConfigError;
pub use error::TableError;
pub use hash::DefaultHashBuilder;
pub use hash::HashFamily;
pub use hash::HashFunctions;
pub use hash_table::HashTable;
pub use robin::RobinTable;
