//! Foundation types for gitk.
//!
//! This crate provides the identifier and classification types shared by every
//! other gitk crate. It has no knowledge of storage or hashing; it only defines
//! what an identifier looks like and how errors are classified.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (32-byte BLAKE3 digest)
//! - [`ObjectKind`] -- The object variant tag (`blob`, `tree`, `commit`)
//! - [`ErrorKind`] -- The error taxonomy every crate maps its errors onto

pub mod error;
pub mod kind;
pub mod object;

pub use error::{ErrorKind, TypeError};
pub use kind::ObjectKind;
pub use object::ObjectId;
