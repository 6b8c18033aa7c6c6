//! Artifact persistence for Benchwatch.
//!
//! This crate moves a [`HistoryStore`](benchwatch_core::HistoryStore)
//! between memory and the `data.js` artifact a static dashboard reads.
//!
//! # Quick Start
//!
//! ```no_run
//! use benchwatch_storage::io;
//!
//! let store = io::load("dev/bench/data.js")?;
//! println!("{} entries", store.len());
//! io::save("dev/bench/data.js", &store)?;
//! # Ok::<(), benchwatch_storage::StorageError>(())
//! ```
//!
//! # Modules
//!
//! - [`io`] - load, atomic save and the read-modify-write cycle
//! - [`error`] - storage errors

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod io;

pub use error::{Result, StorageError};
