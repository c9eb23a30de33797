use gitk_types::{ObjectId, ObjectKind};

/// Header-prefixed BLAKE3 content hasher.
///
/// Each hasher carries the object kind whose tag is prepended, together with
/// the content length, to every hash computation. A blob and a tree with
/// identical bytes therefore produce different identifiers.
pub struct ContentHasher {
    kind: ObjectKind,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self {
        kind: ObjectKind::Blob,
    };
    /// Hasher for tree objects.
    pub const TREE: Self = Self {
        kind: ObjectKind::Tree,
    };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self {
        kind: ObjectKind::Commit,
    };

    /// The hasher for a given kind.
    pub const fn for_kind(kind: ObjectKind) -> Self {
        Self { kind }
    }

    /// Hash content bytes under this hasher's header.
    pub fn hash(&self, content: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&object_header(self.kind, content.len()));
        hasher.update(content);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash an already-encoded envelope (header and content) verbatim.
    pub fn hash_envelope(envelope: &[u8]) -> ObjectId {
        ObjectId::from_hash(*blake3::hash(envelope).as_bytes())
    }

    /// Verify that content produces the expected object ID.
    pub fn verify(&self, content: &[u8], expected: &ObjectId) -> bool {
        self.hash(content) == *expected
    }

    /// The kind whose header this hasher writes.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
}

/// The canonical header for an object of `kind` with `len` content bytes.
pub fn object_header(kind: ObjectKind, len: usize) -> Vec<u8> {
    format!("{} {}\0", kind.as_str(), len).into_bytes()
}

/// Compute the identifier of `(kind, content)`.
pub fn compute_identifier(kind: ObjectKind, content: &[u8]) -> ObjectId {
    ContentHasher::for_kind(kind).hash(content)
}
