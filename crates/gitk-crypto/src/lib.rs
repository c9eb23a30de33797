//! Content hashing and object envelopes for gitk.
//!
//! Every object is identified by the BLAKE3 digest of a header naming its kind
//! and byte length, followed by the content itself:
//!
//! ```text
//! "<kind> <decimal length>\0<content>"
//! ```
//!
//! The same byte sequence is what the object store persists, so re-hashing a
//! fetched envelope always reproduces the identifier it was stored under.
//!
//! The digest algorithm is fixed. Changing it changes every identifier ever
//! produced, so it is part of the storage format, not a tunable.

pub mod envelope;
pub mod hasher;

pub use envelope::{decode_envelope, encode_envelope, EnvelopeError};
pub use hasher::{compute_identifier, object_header, ContentHasher};
