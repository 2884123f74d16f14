//! Trace fingerprinting for a coverage-guided fuzzer.
//!
//! The core is [`hash::hash32`], a fast non-cryptographic hash over fixed-length
//! trace buffers. Everything else in this crate is built around it: count
//! classification, per-run trace deduplication and avalanche statistics.

extern crate helpers;
extern crate serde;
extern crate serde_derive;

pub mod args;
pub mod bitmap;
pub mod config;
pub mod corpus;
pub mod error;
pub mod hash;
pub mod localhashmap;
pub mod romu;
pub mod stats;

pub use error::Error;
pub use hash::{hash32, hash32_narrow, hash32_wide, hash32_with, hash64, HashVariant, HASH_CONST};
pub use localhashmap::TraceDeduper;
