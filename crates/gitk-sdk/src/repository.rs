use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use gitk_index::{normalize_path, Index, IndexEntry, IndexStatus, INDEX_FILE};
use gitk_mind::{Analysis, Assistant, Documentation, HttpAssistant, Review};
use gitk_refs::names::{branch_ref, remote_ref, HEADS_PREFIX};
use gitk_refs::{validate_branch_name, BranchInfo, RefValue, HEAD};
use gitk_store::{BlobClient, Commit, EntryMode, Object, OpContext};
use gitk_sync::{
    collect_garbage, fetch, push, verify_repository, Endpoint, FetchRequest, FetchResult, GcReport,
    PushRequest, PushResult, VerificationReport,
};
use gitk_types::{ObjectId, ObjectKind};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::commit::{CommitOutcome, CommitRequest, LogEntry};
use crate::config::{RepoConfig, GITK_DIR};
use crate::error::{SdkError, SdkResult};

/// Branch HEAD points at in a fresh repository.
pub const DEFAULT_BRANCH: &str = "main";

/// A file read from the working tree, ready to be staged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingFile {
    pub path: String,
    pub data: Vec<u8>,
    pub mode: EntryMode,
}

impl WorkingFile {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
            mode: EntryMode::Regular,
        }
    }

    pub fn with_mode(mut self, mode: EntryMode) -> Self {
        self.mode = mode;
        self
    }
}

/// High-level gitk repository API.
///
/// Wires the configuration, the blob-store client, the object and reference
/// stores and the staging index together. Every remote operation takes an
/// [`OpContext`]; [`Repository::context`] builds one from `[core]`.
pub struct Repository {
    workdir: PathBuf,
    config: RepoConfig,
    client: Arc<dyn BlobClient>,
    local: Endpoint,
    index: Index,
    assistant: Option<Arc<dyn Assistant>>,
}

impl Repository {
    /// Create `.gitk/`, write the config and an empty index, and point HEAD
    /// at `refs/heads/main` unless the namespace already has a HEAD.
    pub async fn init(
        ctx: &OpContext,
        workdir: impl Into<PathBuf>,
        config: RepoConfig,
        client: Arc<dyn BlobClient>,
    ) -> SdkResult<Self> {
        let workdir = workdir.into();
        let config_path = RepoConfig::path_in(&workdir);
        if config_path.exists() {
            return Err(SdkError::AlreadyInitialized(workdir));
        }
        let gitk_dir = workdir.join(GITK_DIR);
        std::fs::create_dir_all(&gitk_dir).map_err(|source| SdkError::Io {
            path: gitk_dir.clone(),
            source,
        })?;
        config.save(&config_path)?;

        let repo = Self::open(workdir, config, client)?;
        if repo.local.refs.try_read_reference(ctx, HEAD).await?.is_none() {
            repo.local
                .refs
                .set_symbolic(ctx, HEAD, &branch_ref(DEFAULT_BRANCH))
                .await?;
        }
        repo.index.save(&repo.index_path())?;
        info!(
            workdir = %repo.workdir.display(),
            bucket = %repo.config.storage.bucket,
            "initialized repository"
        );
        Ok(repo)
    }

    /// Open an initialized repository with an already-loaded config.
    ///
    /// An `[assistant]` section installs an [`HttpAssistant`].
    pub fn open(
        workdir: impl Into<PathBuf>,
        config: RepoConfig,
        client: Arc<dyn BlobClient>,
    ) -> SdkResult<Self> {
        let workdir = workdir.into();
        if !workdir.join(GITK_DIR).is_dir() {
            return Err(SdkError::NotInitialized(workdir));
        }
        let index = Index::load(&workdir.join(GITK_DIR).join(INDEX_FILE))?;
        let assistant: Option<Arc<dyn Assistant>> = match &config.assistant {
            Some(a) => Some(Arc::new(HttpAssistant::new(
                a.base_url.clone(),
                a.api_key.clone(),
            )?)),
            None => None,
        };
        let local = Endpoint::new(client.clone(), config.namespace());
        Ok(Self {
            workdir,
            config,
            client,
            local,
            index,
            assistant,
        })
    }

    /// Load `.gitk/config.toml` from `workdir`.
    pub fn load_config(workdir: &Path) -> SdkResult<RepoConfig> {
        let path = RepoConfig::path_in(workdir);
        if !path.exists() {
            return Err(SdkError::NotInitialized(workdir.to_path_buf()));
        }
        RepoConfig::load(&path)
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    // ---- Accessors ----

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn local(&self) -> &Endpoint {
        &self.local
    }

    /// Context carrying the configured per-command deadline.
    pub fn context(&self) -> OpContext {
        self.config.core.context()
    }

    fn index_path(&self) -> PathBuf {
        self.workdir.join(GITK_DIR).join(INDEX_FILE)
    }

    fn parallelism(&self) -> usize {
        self.config.core.parallelism.max(1)
    }

    // ---- Staging ----

    /// Upload the files as blobs, then stage them.
    ///
    /// Uploads run concurrently up to `[core] parallelism`. The index is only
    /// changed once every upload has succeeded.
    pub async fn add(
        &mut self,
        ctx: &OpContext,
        files: Vec<WorkingFile>,
    ) -> SdkResult<Vec<IndexEntry>> {
        let mut checked = Vec::with_capacity(files.len());
        for file in files {
            checked.push((normalize_path(&file.path)?, file));
        }

        let permits = Arc::new(Semaphore::new(self.parallelism()));
        let mut tasks = JoinSet::new();
        for (path, file) in checked {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| SdkError::Task(e.to_string()))?;
            let (ctx, store) = (ctx.clone(), self.local.objects.clone());
            tasks.spawn(async move {
                let _permit = permit;
                let id = store.put(&ctx, ObjectKind::Blob, &file.data).await?;
                Ok::<_, SdkError>((path, id, file.mode, file.data.len() as u64))
            });
        }

        let mut uploaded = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (path, id, mode, size) = joined.map_err(|e| SdkError::Task(e.to_string()))??;
            uploaded.insert(path, (id, mode, size));
        }

        let mut index = self.index.clone();
        let mut staged = Vec::with_capacity(uploaded.len());
        for (path, (id, mode, size)) in uploaded {
            index.stage(&path, id, mode, size)?;
            if let Some(entry) = index.get(&path) {
                staged.push(entry.clone());
            }
        }
        index.save(&self.index_path())?;
        self.index = index;
        debug!(files = staged.len(), "staged files");
        Ok(staged)
    }

    /// Unstage a path.
    pub fn remove(&mut self, path: &str) -> SdkResult<IndexEntry> {
        let entry = self.index.remove(path)?;
        self.index.save(&self.index_path())?;
        Ok(entry)
    }

    pub fn status(&self) -> IndexStatus {
        self.index.status()
    }

    // ---- Commits ----

    /// Record the index as a new commit and advance HEAD.
    ///
    /// When HEAD is symbolic the branch it names moves, otherwise HEAD itself
    /// does. The move is conditional on the parent read at the start, so a
    /// concurrent commit surfaces as a conflict instead of being lost.
    pub async fn commit(
        &mut self,
        ctx: &OpContext,
        request: CommitRequest,
    ) -> SdkResult<CommitOutcome> {
        let message = self.commit_message(&request).await?;
        let tree = self.index.write_tree(ctx, &self.local.objects).await?;

        let (updated_ref, parent) = match self.local.refs.try_read_reference(ctx, HEAD).await? {
            Some(RefValue::Symbolic(target)) => {
                let parent = self.local.refs.try_get_reference(ctx, &target).await?;
                (target, parent)
            }
            Some(RefValue::Direct(id)) => (HEAD.to_string(), Some(id)),
            None => (HEAD.to_string(), None),
        };

        let author = request
            .author
            .unwrap_or_else(|| self.config.user.author.clone());
        let commit = Commit::new(tree, parent, author, Utc::now(), message);
        let id = self
            .local
            .objects
            .put_object(ctx, &Object::Commit(commit.clone()))
            .await?;

        self.local
            .refs
            .update_reference_if(ctx, &updated_ref, parent, id)
            .await?;
        self.index.mark_committed();
        self.index.save(&self.index_path())?;

        info!(%id, %tree, reference = %updated_ref, "committed");
        Ok(CommitOutcome {
            id,
            commit,
            updated_ref,
        })
    }

    async fn commit_message(&self, request: &CommitRequest) -> SdkResult<String> {
        if let Some(message) = request.message.as_deref() {
            if message.trim().is_empty() {
                return Err(SdkError::EmptyMessage);
            }
            return Ok(message.to_string());
        }
        if !request.use_assistant {
            return Err(SdkError::EmptyMessage);
        }
        let assistant = self.assistant()?;
        let message = assistant.generate_commit_message(&self.index.summary()).await?;
        if message.trim().is_empty() {
            return Err(SdkError::EmptyMessage);
        }
        Ok(message)
    }

    /// Commit HEAD resolves to, or `None` before the first commit.
    pub async fn head(&self, ctx: &OpContext) -> SdkResult<Option<ObjectId>> {
        Ok(self.local.refs.try_get_reference(ctx, HEAD).await?)
    }

    /// Short name of the branch HEAD points at, if HEAD is symbolic.
    pub async fn current_branch(&self, ctx: &OpContext) -> SdkResult<Option<String>> {
        let head = self.local.refs.try_read_reference(ctx, HEAD).await?;
        Ok(head
            .and_then(|v| v.as_symbolic().map(str::to_string))
            .and_then(|target| target.strip_prefix(HEADS_PREFIX).map(str::to_string)))
    }

    /// Walk first parents from HEAD, newest first.
    pub async fn log(&self, ctx: &OpContext, limit: usize) -> SdkResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut next = self.head(ctx).await?;
        while let Some(id) = next {
            if entries.len() >= limit {
                break;
            }
            let commit = self.local.objects.get_commit(ctx, &id).await?;
            next = commit.parent;
            entries.push(LogEntry { id, commit });
        }
        Ok(entries)
    }

    /// Decode any object.
    pub async fn show(&self, ctx: &OpContext, id: &ObjectId) -> SdkResult<Object> {
        Ok(self.local.objects.get_object(ctx, id).await?)
    }

    /// Resolve a revision: a full or abbreviated identifier, `HEAD`, a full
    /// reference name, a branch or a `<remote>/<branch>` tracking name.
    pub async fn resolve(&self, ctx: &OpContext, rev: &str) -> SdkResult<ObjectId> {
        if let Ok(id) = rev.parse::<ObjectId>() {
            return Ok(id);
        }
        let candidates = [
            rev.to_string(),
            branch_ref(rev),
            format!("{}{rev}", gitk_refs::names::REMOTES_PREFIX),
        ];
        for name in candidates.iter().filter(|n| gitk_refs::validate_ref_name(n).is_ok()) {
            if let Some(id) = self.local.refs.try_get_reference(ctx, name).await? {
                return Ok(id);
            }
        }
        if rev.len() >= 4 && rev.chars().all(|c| c.is_ascii_hexdigit()) {
            let prefix = rev.to_ascii_lowercase();
            let matches: Vec<ObjectId> = self
                .local
                .objects
                .list_all(ctx)
                .await?
                .into_iter()
                .filter(|id| id.to_hex().starts_with(&prefix))
                .collect();
            if let [id] = matches.as_slice() {
                return Ok(*id);
            }
        }
        Err(SdkError::UnknownRevision(rev.to_string()))
    }

    // ---- Branches and refs ----

    pub async fn branches(&self, ctx: &OpContext) -> SdkResult<Vec<BranchInfo>> {
        let current = self.current_branch(ctx).await?;
        let refs = self.local.refs.list_prefixed(ctx, HEADS_PREFIX).await?;
        let mut out = Vec::with_capacity(refs.len());
        for (name, value) in refs {
            let target = match value {
                RefValue::Direct(id) => id,
                RefValue::Symbolic(_) => self.local.refs.get_reference(ctx, &name).await?,
            };
            let short = name.strip_prefix(HEADS_PREFIX).unwrap_or(&name).to_string();
            out.push(BranchInfo {
                is_current: current.as_deref() == Some(short.as_str()),
                name: short,
                target,
            });
        }
        Ok(out)
    }

    /// Create `refs/heads/<name>` at `start`, or at HEAD when `start` is `None`.
    pub async fn create_branch(
        &self,
        ctx: &OpContext,
        name: &str,
        start: Option<ObjectId>,
    ) -> SdkResult<ObjectId> {
        validate_branch_name(name)?;
        let target = match start {
            Some(id) => id,
            None => self.head(ctx).await?.ok_or(SdkError::NoCommits)?,
        };
        let full = branch_ref(name);
        if self.local.refs.try_read_reference(ctx, &full).await?.is_some() {
            return Err(SdkError::BranchExists(name.to_string()));
        }
        self.local.refs.update_reference_if(ctx, &full, None, target).await?;
        info!(branch = name, %target, "created branch");
        Ok(target)
    }

    /// Every reference in the local namespace with its raw value.
    pub async fn references(&self, ctx: &OpContext) -> SdkResult<BTreeMap<String, RefValue>> {
        Ok(self.local.refs.list_references(ctx).await?)
    }

    // ---- Sync ----

    /// Endpoint for a configured remote, sharing this repository's client.
    pub fn remote(&self, name: &str) -> SdkResult<Endpoint> {
        let remote = self.config.remote(name)?;
        Ok(Endpoint::new(self.client.clone(), remote.namespace()))
    }

    /// Push `branch` to the same branch at `remote`, then record it as
    /// `refs/remotes/<remote>/<branch>`.
    pub async fn push(
        &self,
        ctx: &OpContext,
        remote: &str,
        branch: &str,
        force: bool,
    ) -> SdkResult<PushResult> {
        validate_branch_name(branch)?;
        let destination = self.remote(remote)?;
        let name = branch_ref(branch);
        let request = PushRequest::new(name.clone(), name)
            .force(force)
            .parallelism(self.parallelism());
        let result = push(ctx, &self.local, &destination, &request).await?;
        self.local
            .refs
            .set_reference(ctx, &remote_ref(remote, branch), result.update.new)
            .await?;
        Ok(result)
    }

    /// Copy `branch` from `remote` into `refs/remotes/<remote>/<branch>`.
    pub async fn fetch(
        &self,
        ctx: &OpContext,
        remote: &str,
        branch: &str,
    ) -> SdkResult<FetchResult> {
        validate_branch_name(branch)?;
        let source = self.remote(remote)?;
        let request = FetchRequest::new(branch_ref(branch), remote_ref(remote, branch))
            .parallelism(self.parallelism());
        Ok(fetch(ctx, &source, &self.local, &request).await?)
    }

    // ---- Maintenance ----

    /// Mark from every reference and sweep the rest. Staged blobs are kept
    /// so that the next commit can still reference them.
    pub async fn gc(&self, ctx: &OpContext, dry_run: bool) -> SdkResult<GcReport> {
        let staged: Vec<ObjectId> = self.index.entries().map(|e| e.object_id).collect();
        Ok(collect_garbage(ctx, &self.local, &staged, dry_run).await?)
    }

    pub async fn fsck(&self, ctx: &OpContext) -> SdkResult<VerificationReport> {
        Ok(verify_repository(ctx, &self.local).await?)
    }

    // ---- Assistant ----

    pub fn assistant(&self) -> SdkResult<&Arc<dyn Assistant>> {
        self.assistant.as_ref().ok_or(SdkError::NoAssistant)
    }

    /// Review the staged changes.
    pub async fn review(&self) -> SdkResult<Review> {
        Ok(self.assistant()?.review_code(&self.index.summary()).await?)
    }

    pub async fn analyze(&self, path: &str) -> SdkResult<Analysis> {
        Ok(self.assistant()?.analyze_repository(path).await?)
    }

    pub async fn docs(&self, path: &str) -> SdkResult<Documentation> {
        Ok(self.assistant()?.generate_documentation(path).await?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("workdir", &self.workdir)
            .field("namespace", self.local.objects.namespace())
            .field("staged", &self.index.len())
            .field("assistant", &self.assistant.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitk_mind::StaticAssistant;
    use gitk_store::InMemoryBlobClient;
    use gitk_sync::SyncError;
    use gitk_types::ErrorKind;
    use tempfile::TempDir;

    use crate::config::RemoteConfig;

    struct Fixture {
        _dir: TempDir,
        client: Arc<InMemoryBlobClient>,
        repo: Repository,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(InMemoryBlobClient::new());
        let mut config = RepoConfig::new("local", "repo");
        config.user.author = "Test <test@example.com>".into();
        config.remotes.insert("origin".into(), RemoteConfig::new("remote", "repo"));
        let ctx = OpContext::background();
        let repo = Repository::init(&ctx, dir.path(), config, client.clone()).await.unwrap();
        Fixture {
            _dir: dir,
            client,
            repo,
        }
    }

    #[tokio::test]
    async fn init_points_head_at_main() {
        let f = fixture().await;
        let ctx = OpContext::background();
        let head = f.repo.local().refs.read_reference(&ctx, HEAD).await.unwrap();
        assert_eq!(head, RefValue::Symbolic("refs/heads/main".into()));
        assert_eq!(f.repo.current_branch(&ctx).await.unwrap().as_deref(), Some("main"));
        assert_eq!(f.repo.head(&ctx).await.unwrap(), None);
        assert!(RepoConfig::path_in(f.repo.workdir()).exists());
    }

    #[tokio::test]
    async fn init_twice_is_rejected() {
        let f = fixture().await;
        let ctx = OpContext::background();
        let err = Repository::init(&ctx, f.repo.workdir(), RepoConfig::default(), f.client.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::AlreadyInitialized(_)));
    }

    #[tokio::test]
    async fn open_requires_gitk_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::load_config(dir.path()).unwrap_err();
        assert!(matches!(err, SdkError::NotInitialized(_)));
        let client = Arc::new(InMemoryBlobClient::new());
        let err = Repository::open(dir.path(), RepoConfig::default(), client).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn add_then_first_commit() {
        let mut f = fixture().await;
        let ctx = OpContext::background();

        let staged = f
            .repo
            .add(&ctx, vec![WorkingFile::new("file.txt", "hello")])
            .await
            .unwrap();
        assert_eq!(staged.len(), 1);
        let expected = gitk_crypto::ContentHasher::hash_envelope(b"blob 5\0hello");
        assert_eq!(staged[0].object_id, expected);
        assert!(f.repo.local().objects.exists(&ctx, &expected).await.unwrap());

        let outcome = f.repo.commit(&ctx, CommitRequest::new("first")).await.unwrap();
        assert!(outcome.commit.parent.is_none());
        assert_eq!(outcome.commit.message, "first");
        assert_eq!(outcome.commit.author, "Test <test@example.com>");
        assert_eq!(outcome.updated_ref, "refs/heads/main");

        let head = f.repo.local().refs.get_reference(&ctx, "HEAD").await.unwrap();
        assert_eq!(head, outcome.id);
        let stored = f.repo.local().objects.get_commit(&ctx, &head).await.unwrap();
        assert_eq!(stored, outcome.commit);
        assert!(f.repo.status().is_clean());
    }

    #[tokio::test]
    async fn second_commit_links_parent_and_log_walks_back() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("a.txt", "1")]).await.unwrap();
        let c1 = f.repo.commit(&ctx, CommitRequest::new("one")).await.unwrap();
        f.repo.add(&ctx, vec![WorkingFile::new("a.txt", "2")]).await.unwrap();
        assert_eq!(f.repo.status().changes.len(), 1);
        let c2 = f.repo.commit(&ctx, CommitRequest::new("two")).await.unwrap();
        assert_eq!(c2.commit.parent, Some(c1.id));

        let log = f.repo.log(&ctx, 10).await.unwrap();
        let ids: Vec<_> = log.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c2.id, c1.id]);
        assert_eq!(f.repo.log(&ctx, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn detached_head_moves_itself() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("a", "1")]).await.unwrap();
        let c1 = f.repo.commit(&ctx, CommitRequest::new("one")).await.unwrap();
        f.repo.local().refs.set_reference(&ctx, HEAD, c1.id).await.unwrap();

        f.repo.add(&ctx, vec![WorkingFile::new("b", "2")]).await.unwrap();
        let c2 = f.repo.commit(&ctx, CommitRequest::new("two")).await.unwrap();
        assert_eq!(c2.updated_ref, HEAD);
        assert_eq!(f.repo.head(&ctx).await.unwrap(), Some(c2.id));
        let main = f.repo.local().refs.get_reference(&ctx, "refs/heads/main").await.unwrap();
        assert_eq!(main, c1.id);
        assert_eq!(f.repo.current_branch(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn nested_paths_build_nested_trees() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo
            .add(
                &ctx,
                vec![
                    WorkingFile::new("src/lib.rs", "pub fn f() {}"),
                    WorkingFile::new("README", "hi"),
                    WorkingFile::new("bin/run", "#!/bin/sh").with_mode(EntryMode::Executable),
                ],
            )
            .await
            .unwrap();
        let c = f.repo.commit(&ctx, CommitRequest::new("tree")).await.unwrap();
        let root = f.repo.local().objects.get_tree(&ctx, &c.commit.tree).await.unwrap();
        let names: Vec<_> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["README", "bin", "src"]);
        assert_eq!(root.get("src").unwrap().mode, EntryMode::Directory);
    }

    #[tokio::test]
    async fn failed_upload_leaves_index_untouched() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.client.fail_upload(f.client.upload_count() + 1);
        let err = f
            .repo
            .add(&ctx, vec![WorkingFile::new("a", "1")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(f.repo.index().is_empty());
    }

    #[tokio::test]
    async fn remove_unstages_and_persists() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo
            .add(&ctx, vec![WorkingFile::new("a", "1"), WorkingFile::new("b", "2")])
            .await
            .unwrap();
        f.repo.remove("a").unwrap();
        assert!(f.repo.remove("a").is_err());

        let config = f.repo.config().clone();
        let reopened = Repository::open(f.repo.workdir(), config, f.client.clone()).unwrap();
        let paths: Vec<_> = reopened.index().paths().collect();
        assert_eq!(paths, vec!["b"]);
    }

    #[tokio::test]
    async fn invalid_path_is_rejected_before_upload() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        let before = f.client.upload_count();
        let err = f
            .repo
            .add(&ctx, vec![WorkingFile::new("../escape", "x")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(f.client.upload_count(), before);
    }

    #[tokio::test]
    async fn commit_requires_message_unless_assisted() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        let err = f.repo.commit(&ctx, CommitRequest::default()).await.unwrap_err();
        assert!(matches!(err, SdkError::EmptyMessage));
        let err = f.repo.commit(&ctx, CommitRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, SdkError::EmptyMessage));
        let err = f.repo.commit(&ctx, CommitRequest::assisted()).await.unwrap_err();
        assert!(matches!(err, SdkError::NoAssistant));
        assert_eq!(f.repo.head(&ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn assisted_commit_uses_generated_message() {
        let mut f = fixture().await;
        f.repo = f
            .repo
            .with_assistant(Arc::new(StaticAssistant::with_commit_message("Add greeting")));
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("hello.txt", "hi")]).await.unwrap();
        let c = f.repo.commit(&ctx, CommitRequest::assisted()).await.unwrap();
        assert_eq!(c.commit.message, "Add greeting");
    }

    #[tokio::test]
    async fn branches_and_resolve() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        let err = f.repo.create_branch(&ctx, "dev", None).await.unwrap_err();
        assert!(matches!(err, SdkError::NoCommits));

        f.repo.add(&ctx, vec![WorkingFile::new("a", "1")]).await.unwrap();
        let c = f.repo.commit(&ctx, CommitRequest::new("one")).await.unwrap();
        f.repo.create_branch(&ctx, "dev", None).await.unwrap();
        let err = f.repo.create_branch(&ctx, "dev", None).await.unwrap_err();
        assert!(matches!(err, SdkError::BranchExists(_)));
        assert!(f.repo.create_branch(&ctx, "bad..name", None).await.is_err());

        let branches = f.repo.branches(&ctx).await.unwrap();
        let names: Vec<_> = branches.iter().map(|b| (b.name.as_str(), b.is_current)).collect();
        assert_eq!(names, vec![("dev", false), ("main", true)]);

        assert_eq!(f.repo.resolve(&ctx, "HEAD").await.unwrap(), c.id);
        assert_eq!(f.repo.resolve(&ctx, "dev").await.unwrap(), c.id);
        assert_eq!(f.repo.resolve(&ctx, &c.id.to_hex()).await.unwrap(), c.id);
        assert_eq!(f.repo.resolve(&ctx, &c.id.to_hex()[..12]).await.unwrap(), c.id);
        assert!(matches!(
            f.repo.resolve(&ctx, "nope").await,
            Err(SdkError::UnknownRevision(_))
        ));

        let shown = f.repo.show(&ctx, &c.id).await.unwrap();
        assert_eq!(shown.kind(), ObjectKind::Commit);
    }

    #[tokio::test]
    async fn push_then_fetch_through_remote() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("a", "1")]).await.unwrap();
        let c = f.repo.commit(&ctx, CommitRequest::new("one")).await.unwrap();

        let pushed = f.repo.push(&ctx, "origin", "main", false).await.unwrap();
        assert_eq!(pushed.update.new, c.id);
        assert_eq!(pushed.stats.copied, 3);
        let remote = f.repo.remote("origin").unwrap();
        assert_eq!(remote.refs.get_reference(&ctx, "refs/heads/main").await.unwrap(), c.id);
        assert_eq!(f.repo.resolve(&ctx, "origin/main").await.unwrap(), c.id);

        let fetched = f.repo.fetch(&ctx, "origin", "main").await.unwrap();
        assert_eq!(fetched.update.new, c.id);
        assert_eq!(fetched.stats.copied, 0);

        assert!(matches!(
            f.repo.push(&ctx, "upstream", "main", false).await,
            Err(SdkError::UnknownRemote(_))
        ));
    }

    #[tokio::test]
    async fn diverged_push_needs_force() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("a", "1")]).await.unwrap();
        let c1 = f.repo.commit(&ctx, CommitRequest::new("one")).await.unwrap();
        f.repo.push(&ctx, "origin", "main", false).await.unwrap();

        // Rewrite main to a root commit that does not contain c1.
        f.repo.local().refs.delete_reference(&ctx, "refs/heads/main").await.unwrap();
        f.repo.add(&ctx, vec![WorkingFile::new("b", "2")]).await.unwrap();
        let c2 = f.repo.commit(&ctx, CommitRequest::new("rewrite")).await.unwrap();
        assert_ne!(c2.commit.parent, Some(c1.id));

        let err = f.repo.push(&ctx, "origin", "main", false).await.unwrap_err();
        assert!(matches!(err, SdkError::Sync(SyncError::NotFastForward { .. })));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let forced = f.repo.push(&ctx, "origin", "main", true).await.unwrap();
        assert!(forced.forced);
    }

    #[tokio::test]
    async fn gc_and_fsck() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("a", "1")]).await.unwrap();
        f.repo.commit(&ctx, CommitRequest::new("one")).await.unwrap();
        // Replaced in the index before being committed: unreachable.
        f.repo.add(&ctx, vec![WorkingFile::new("a", "2")]).await.unwrap();
        f.repo.add(&ctx, vec![WorkingFile::new("a", "3")]).await.unwrap();

        let report = f.repo.fsck(&ctx).await.unwrap();
        assert!(report.is_clean());

        let dry = f.repo.gc(&ctx, true).await.unwrap();
        assert_eq!(dry.unreachable.len(), 1);
        assert_eq!(dry.pinned, 1);
        let swept = f.repo.gc(&ctx, false).await.unwrap();
        assert_eq!(swept.unreachable, dry.unreachable);
        let again = f.repo.gc(&ctx, true).await.unwrap();
        assert!(again.unreachable.is_empty());
    }

    #[tokio::test]
    async fn gc_keeps_staged_blobs_for_next_commit() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        let staged = f
            .repo
            .add(&ctx, vec![WorkingFile::new("file.txt", "hello")])
            .await
            .unwrap();

        let report = f.repo.gc(&ctx, false).await.unwrap();
        assert!(report.unreachable.is_empty());
        assert!(f.repo.local().objects.exists(&ctx, &staged[0].object_id).await.unwrap());

        f.repo.commit(&ctx, CommitRequest::new("first")).await.unwrap();
        assert!(f.repo.fsck(&ctx).await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn commit_refuses_staged_blob_missing_from_store() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        let staged = f
            .repo
            .add(&ctx, vec![WorkingFile::new("file.txt", "hello")])
            .await
            .unwrap();
        f.repo.local().objects.delete(&ctx, &staged[0].object_id).await.unwrap();
        let uploads = f.client.upload_count();

        let err = f.repo.commit(&ctx, CommitRequest::new("first")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(f.repo.head(&ctx).await.unwrap(), None);
        assert_eq!(f.client.upload_count(), uploads);
    }

    #[tokio::test]
    async fn conflicting_add_leaves_index_untouched() {
        let mut f = fixture().await;
        let ctx = OpContext::background();
        f.repo.add(&ctx, vec![WorkingFile::new("a", "file")]).await.unwrap();
        let err = f
            .repo
            .add(
                &ctx,
                vec![WorkingFile::new("b", "ok"), WorkingFile::new("a/b", "nested")],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let paths: Vec<_> = f.repo.index().paths().collect();
        assert_eq!(paths, vec!["a"]);
        f.repo.commit(&ctx, CommitRequest::new("m")).await.unwrap();
    }

    #[tokio::test]
    async fn assistant_passthroughs() {
        let f = fixture().await;
        assert!(matches!(f.repo.review().await, Err(SdkError::NoAssistant)));
        let repo = f.repo.with_assistant(Arc::new(StaticAssistant::default()));
        assert!(repo.review().await.unwrap().comments.is_empty());
        assert_eq!(repo.analyze(".").await.unwrap().score, 0.0);
        assert!(!repo.docs(".").await.unwrap().generated);
    }
}
