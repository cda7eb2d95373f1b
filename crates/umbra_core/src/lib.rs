//! # umbra_core - Core Primitives
//!
//! Zero-dependency building blocks shared by the umbra crates:
//! - **Modification clock**: a process-wide monotonic counter used to stamp
//!   every scene mutation, so staleness checks reduce to integer compares
//! - **Identifiers**: compact ids for scene objects

#![cfg_attr(not(feature = "std"), no_std)]

pub mod id;
pub mod time_stamp;

pub use id::*;
pub use time_stamp::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{Id, IdGenerator};
    pub use crate::time_stamp::{ModificationClock, TimeStamp};
}
