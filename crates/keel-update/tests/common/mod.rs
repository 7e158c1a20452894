//! Common test infrastructure for keel-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Versions, platform keys, test payloads
//! - `builders`: Manifest builder and gzip helpers
//! - `mock_server`: Wiremock setup helpers for manifests and artifacts
//! - `env`: Temporary install directories with a canonical binary

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod env;
pub mod mock_server;

pub use builders::*;
pub use constants::*;
pub use env::*;
pub use mock_server::*;
