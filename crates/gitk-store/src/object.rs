use chrono::{DateTime, Utc};
use gitk_crypto::compute_identifier;
use gitk_types::{ObjectId, ObjectKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DecodeError, TreeError};

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Any storable object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    /// The kind tag written into this object's header.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Canonical content bytes (without the header).
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Self::Blob(blob) => blob.data.clone(),
            Self::Tree(tree) => canonical_json(tree),
            Self::Commit(commit) => canonical_json(commit),
        }
    }

    /// Decode content bytes of the given kind.
    pub fn deserialize(kind: ObjectKind, content: &[u8]) -> Result<Self, DecodeError> {
        match kind {
            ObjectKind::Blob => Ok(Self::Blob(Blob::new(content.to_vec()))),
            ObjectKind::Tree => {
                let wire: TreeWire = parse_body(kind, content)?;
                Ok(Self::Tree(Tree::from_canonical(wire.entries)?))
            }
            ObjectKind::Commit => Ok(Self::Commit(parse_body(kind, content)?)),
        }
    }

    /// The identifier this object is stored under.
    pub fn id(&self) -> ObjectId {
        compute_identifier(self.kind(), &self.serialize())
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Self::Commit(commit)
    }
}

fn canonical_json<T: Serialize>(value: &T) -> Vec<u8> {
    // Only string, identifier and timestamp fields: serialization is infallible.
    serde_json::to_vec(value).unwrap_or_default()
}

fn parse_body<'a, T: Deserialize<'a>>(
    kind: ObjectKind,
    content: &'a [u8],
) -> Result<T, DecodeError> {
    serde_json::from_slice(content).map_err(|e| DecodeError::Body {
        kind,
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (100644).
    Regular,
    /// Executable file (100755).
    Executable,
    /// Symbolic link (120000).
    Symlink,
    /// Subtree / directory (040000).
    Directory,
}

impl EntryMode {
    /// Six-digit octal form used in serialized trees.
    pub fn as_octal(&self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Executable => "100755",
            Self::Symlink => "120000",
            Self::Directory => "040000",
        }
    }

    /// Parse the six-digit octal form.
    pub fn from_octal(s: &str) -> Option<Self> {
        match s {
            "100644" => Some(Self::Regular),
            "100755" => Some(Self::Executable),
            "120000" => Some(Self::Symlink),
            "040000" => Some(Self::Directory),
            _ => None,
        }
    }

    /// The object kind an entry with this mode must point at.
    pub fn target_kind(&self) -> ObjectKind {
        match self {
            Self::Directory => ObjectKind::Tree,
            _ => ObjectKind::Blob,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_octal())
    }
}

impl Serialize for EntryMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_octal())
    }
}

impl<'de> Deserialize<'de> for EntryMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EntryMode::from_octal(&s).ok_or_else(|| serde::de::Error::custom(TreeError::UnknownMode(s)))
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name: a single path segment.
    pub name: String,
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Content-addressed ID of the referenced object.
    pub target: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(name: impl Into<String>, mode: EntryMode, target: ObjectId) -> Self {
        Self {
            name: name.into(),
            mode,
            target,
        }
    }
}

/// Check that `name` is usable as a single path segment.
pub fn validate_entry_name(name: &str) -> Result<(), TreeError> {
    let reason = if name.is_empty() {
        "empty"
    } else if name == "." || name == ".." {
        "relative segment"
    } else if name.contains('/') {
        "contains '/'"
    } else if name.contains('\0') {
        "contains NUL"
    } else {
        return Ok(());
    };
    Err(TreeError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// Directory listing object (analogous to git tree).
///
/// Entries are kept sorted by name and names are unique, so two trees with the
/// same entries always serialize to the same bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct TreeWire {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree from entries in any order.
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self, TreeError> {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        for entry in &entries {
            validate_entry_name(&entry.name)?;
        }
        if let Some(pair) = entries.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(TreeError::DuplicateName(pair[0].name.clone()));
        }
        Ok(Self { entries })
    }

    /// Accept entries only if they are already in canonical order.
    fn from_canonical(entries: Vec<TreeEntry>) -> Result<Self, TreeError> {
        if let Some(pair) = entries.windows(2).find(|w| w[0].name > w[1].name) {
            return Err(TreeError::Unsorted(pair[1].name.clone()));
        }
        Self::new(entries)
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TreeEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a TreeEntry;
    type IntoIter = std::slice::Iter<'a, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A tree snapshot with history metadata (analogous to git commit).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Previous commit; `None` for the first commit, serialized as `""`.
    #[serde(with = "optional_id")]
    pub parent: Option<ObjectId>,
    /// Author identity, e.g. `"Jane <jane@example.com>"`.
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl Commit {
    pub fn new(
        tree: ObjectId,
        parent: Option<ObjectId>,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parent,
            author: author.into(),
            timestamp,
            message: message.into(),
        }
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

mod optional_id {
    use gitk_types::ObjectId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        id: &Option<ObjectId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_str(&id.to_hex()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ObjectId>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(None);
        }
        ObjectId::from_hex(&s).map(Some).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 32])
    }

    fn sample_commit(parent: Option<ObjectId>) -> Commit {
        Commit::new(
            id(1),
            parent,
            "Ada <ada@example.com>",
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            "first\n\nbody",
        )
    }

    #[test]
    fn blob_roundtrip() {
        let obj = Object::Blob(Blob::new(b"hello world".to_vec()));
        let bytes = obj.serialize();
        assert_eq!(bytes, b"hello world");
        assert_eq!(Object::deserialize(ObjectKind::Blob, &bytes).unwrap(), obj);
    }

    #[test]
    fn blob_id_matches_scenario_vector() {
        let obj = Object::Blob(Blob::new("hello"));
        let expected = gitk_crypto::ContentHasher::hash_envelope(b"blob 5\0hello");
        assert_eq!(obj.id(), expected);
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::new("zebra.txt", EntryMode::Regular, id(1)),
            TreeEntry::new("alpha.txt", EntryMode::Regular, id(2)),
            TreeEntry::new("middle", EntryMode::Directory, id(3)),
        ])
        .unwrap();
        let names: Vec<_> = tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha.txt", "middle", "zebra.txt"]);
    }

    #[test]
    fn tree_rejects_duplicates() {
        let err = Tree::new(vec![
            TreeEntry::new("a", EntryMode::Regular, id(1)),
            TreeEntry::new("a", EntryMode::Executable, id(2)),
        ])
        .unwrap_err();
        assert_eq!(err, TreeError::DuplicateName("a".into()));
    }

    #[test]
    fn tree_rejects_bad_names() {
        for name in ["", ".", "..", "a/b", "nul\0"] {
            assert!(
                Tree::new(vec![TreeEntry::new(name, EntryMode::Regular, id(1))]).is_err(),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn tree_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::new("file.txt", EntryMode::Regular, id(4)),
            TreeEntry::new("run.sh", EntryMode::Executable, id(5)),
            TreeEntry::new("subdir", EntryMode::Directory, id(6)),
        ])
        .unwrap();
        let obj = Object::Tree(tree);
        let bytes = obj.serialize();
        assert_eq!(Object::deserialize(ObjectKind::Tree, &bytes).unwrap(), obj);
    }

    #[test]
    fn tree_wire_format_is_canonical_json() {
        let tree = Tree::new(vec![TreeEntry::new("a", EntryMode::Directory, id(0))]).unwrap();
        let text = String::from_utf8(Object::Tree(tree).serialize()).unwrap();
        assert_eq!(
            text,
            format!(
                "{{\"entries\":[{{\"name\":\"a\",\"mode\":\"040000\",\"target\":\"{}\"}}]}}",
                "0".repeat(64)
            )
        );
    }

    #[test]
    fn tree_decode_rejects_duplicates_and_disorder() {
        let target = "1".repeat(64);
        let entry = |name: &str| {
            format!(r#"{{"name":"{name}","mode":"100644","target":"{target}"}}"#)
        };
        let dup = format!("{{\"entries\":[{},{}]}}", entry("a"), entry("a"));
        assert!(matches!(
            Object::deserialize(ObjectKind::Tree, dup.as_bytes()),
            Err(DecodeError::Tree(TreeError::DuplicateName(_)))
        ));

        let unsorted = format!("{{\"entries\":[{},{}]}}", entry("b"), entry("a"));
        assert!(matches!(
            Object::deserialize(ObjectKind::Tree, unsorted.as_bytes()),
            Err(DecodeError::Tree(TreeError::Unsorted(_)))
        ));
    }

    #[test]
    fn tree_decode_rejects_garbage() {
        assert!(matches!(
            Object::deserialize(ObjectKind::Tree, b"not json"),
            Err(DecodeError::Body { kind: ObjectKind::Tree, .. })
        ));
        let bad_mode = format!(
            "{{\"entries\":[{{\"name\":\"a\",\"mode\":\"777\",\"target\":\"{}\"}}]}}",
            "1".repeat(64)
        );
        assert!(Object::deserialize(ObjectKind::Tree, bad_mode.as_bytes()).is_err());
    }

    #[test]
    fn tree_get_entry() {
        let tree = Tree::new(vec![
            TreeEntry::new("a.txt", EntryMode::Regular, id(1)),
            TreeEntry::new("b.txt", EntryMode::Regular, id(2)),
        ])
        .unwrap();
        assert_eq!(tree.get("b.txt").map(|e| e.target), Some(id(2)));
        assert!(tree.get("missing").is_none());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn empty_tree() {
        let tree = Tree::empty();
        assert!(tree.is_empty());
        let obj = Object::Tree(tree);
        assert_eq!(Object::deserialize(ObjectKind::Tree, &obj.serialize()).unwrap(), obj);
    }

    #[test]
    fn entry_mode_octal_roundtrip() {
        for mode in [
            EntryMode::Regular,
            EntryMode::Executable,
            EntryMode::Symlink,
            EntryMode::Directory,
        ] {
            assert_eq!(EntryMode::from_octal(mode.as_octal()), Some(mode));
        }
        assert!(EntryMode::from_octal("100600").is_none());
        assert_eq!(EntryMode::Directory.target_kind(), ObjectKind::Tree);
        assert_eq!(EntryMode::Symlink.target_kind(), ObjectKind::Blob);
    }

    #[test]
    fn commit_roundtrip_with_and_without_parent() {
        for parent in [None, Some(id(9))] {
            let obj = Object::Commit(sample_commit(parent));
            let bytes = obj.serialize();
            assert_eq!(Object::deserialize(ObjectKind::Commit, &bytes).unwrap(), obj);
        }
    }

    #[test]
    fn root_commit_serializes_empty_parent() {
        let text = String::from_utf8(Object::Commit(sample_commit(None)).serialize()).unwrap();
        assert!(text.contains("\"parent\":\"\""), "{text}");
    }

    #[test]
    fn commit_summary_is_first_line() {
        let commit = sample_commit(None);
        assert_eq!(commit.summary(), "first");
        assert!(commit.is_root());
    }

    #[test]
    fn commit_decode_rejects_bad_parent() {
        let body = concat!(
            r#"{"tree":"00","parent":"","author":"a","#,
            r#""timestamp":"2024-01-01T00:00:00Z","message":"m"}"#
        )
        .as_bytes();
        assert!(matches!(
            Object::deserialize(ObjectKind::Commit, body),
            Err(DecodeError::Body { kind: ObjectKind::Commit, .. })
        ));
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let blob = Object::Blob(Blob::new(b"{\"entries\":[]}".to_vec()));
        let tree = Object::Tree(Tree::empty());
        assert_eq!(blob.serialize(), tree.serialize());
        assert_ne!(blob.id(), tree.id());
    }
}
