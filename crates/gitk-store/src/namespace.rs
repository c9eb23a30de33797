//! Backing-store key layout.

use gitk_types::ObjectId;

/// Where a repository's objects and references live in the backing store.
///
/// Objects are fanned out as `<prefix>/objects/<2 hex>/<62 hex>` so no single
/// listing level grows unbounded; references live at `<prefix>/refs/<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    bucket: String,
    prefix: String,
}

impl Namespace {
    /// Create a namespace. Leading and trailing slashes on `prefix` are ignored.
    pub fn new(bucket: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn join(&self, rest: &str) -> String {
        if self.prefix.is_empty() {
            rest.to_string()
        } else {
            format!("{}/{rest}", self.prefix)
        }
    }

    /// Listing prefix for every object.
    pub fn objects_root(&self) -> String {
        self.join("objects/")
    }

    /// Storage path of one object.
    pub fn object_path(&self, id: &ObjectId) -> String {
        let (dir, leaf) = id.fanout();
        self.join(&format!("objects/{dir}/{leaf}"))
    }

    /// Recover an identifier from an object path, if it is one.
    pub fn parse_object_path(&self, path: &str) -> Option<ObjectId> {
        let rest = path.strip_prefix(&self.objects_root())?;
        let (dir, leaf) = rest.split_once('/')?;
        if dir.len() != ObjectId::FANOUT_LEN || leaf.contains('/') {
            return None;
        }
        ObjectId::from_hex(&format!("{dir}{leaf}")).ok()
    }

    /// Listing prefix for every reference.
    pub fn refs_root(&self) -> String {
        self.join("refs/")
    }

    /// Storage path of one reference.
    pub fn ref_path(&self, name: &str) -> String {
        self.join(&format!("refs/{name}"))
    }

    /// Recover a reference name from a reference path.
    pub fn parse_ref_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let root = self.refs_root();
        path.strip_prefix(root.as_str()).filter(|name| !name.is_empty())
    }
}
