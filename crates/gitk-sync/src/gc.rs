//! Mark-and-sweep garbage collection.

use std::collections::BTreeSet;

use gitk_refs::RefValue;
use gitk_store::OpContext;
use gitk_types::ObjectId;
use tracing::{info, warn};

use crate::error::SyncResult;
use crate::reachability::Walker;
use crate::types::Endpoint;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Objects kept because a reference reaches them.
    pub reachable: usize,
    /// Unreferenced objects kept because the caller pinned them.
    pub pinned: usize,
    /// Objects deleted, or that would be deleted on a dry run.
    pub unreachable: Vec<ObjectId>,
    pub dry_run: bool,
}

/// Delete every object no reference reaches.
///
/// Roots are the direct references plus whatever symbolic references resolve
/// to. Objects in `pinned` (e.g. staged but uncommitted blobs) are kept even
/// when nothing reaches them. If any history cannot be walked nothing is
/// deleted.
pub async fn collect_garbage(
    ctx: &OpContext,
    repo: &Endpoint,
    pinned: &[ObjectId],
    dry_run: bool,
) -> SyncResult<GcReport> {
    let refs = repo.refs.list_references(ctx).await?;
    let mut roots = BTreeSet::new();
    for (name, value) in &refs {
        match value {
            RefValue::Direct(id) => {
                roots.insert(*id);
            }
            RefValue::Symbolic(target) => {
                if !refs.contains_key(target) {
                    warn!(name, target, "symbolic ref points at missing ref");
                }
            }
        }
    }

    let mut walker = Walker::new(&repo.objects);
    for root in &roots {
        walker.walk(ctx, *root).await?;
    }
    let reach = walker.finish();

    let pinned: BTreeSet<ObjectId> = pinned.iter().copied().collect();
    let mut kept_pinned = 0;
    let mut unreachable = Vec::new();
    for id in repo.objects.list_all(ctx).await? {
        if reach.contains(&id) {
            continue;
        }
        if pinned.contains(&id) {
            kept_pinned += 1;
        } else {
            unreachable.push(id);
        }
    }

    if !dry_run {
        for id in &unreachable {
            repo.objects.delete(ctx, id).await?;
        }
    }
    info!(
        reachable = reach.len(),
        pinned = kept_pinned,
        unreachable = unreachable.len(),
        dry_run,
        "garbage collection complete"
    );
    Ok(GcReport {
        reachable: reach.len(),
        pinned: kept_pinned,
        unreachable,
        dry_run,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gitk_store::{Blob, InMemoryBlobClient, Namespace};

    use super::*;
    use crate::reachability::tests::commit_file;

    #[tokio::test]
    async fn sweeps_only_unreachable_objects() {
        let ctx = OpContext::background();
        let repo = Endpoint::new(Arc::new(InMemoryBlobClient::new()), Namespace::new("b", "r"));
        let c1 = commit_file(&repo.objects, None, "a", "one").await;
        let c2 = commit_file(&repo.objects, Some(c1), "a", "two").await;
        let orphan = repo.objects.put_object(&ctx, &Blob::new("orphan").into()).await.unwrap();
        repo.refs.set_symbolic(&ctx, "HEAD", "refs/heads/main").await.unwrap();
        repo.refs.set_reference(&ctx, "refs/heads/main", c2).await.unwrap();

        let report = collect_garbage(&ctx, &repo, &[], true).await.unwrap();
        assert_eq!(report.unreachable, vec![orphan]);
        assert_eq!(report.reachable, 6);
        assert!(repo.objects.exists(&ctx, &orphan).await.unwrap());

        let report = collect_garbage(&ctx, &repo, &[], false).await.unwrap();
        assert_eq!(report.unreachable, vec![orphan]);
        assert!(!repo.objects.exists(&ctx, &orphan).await.unwrap());
        assert_eq!(repo.objects.list_all(&ctx).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn broken_history_aborts_sweep() {
        let ctx = OpContext::background();
        let repo = Endpoint::new(Arc::new(InMemoryBlobClient::new()), Namespace::new("b", "r"));
        let c1 = commit_file(&repo.objects, None, "a", "one").await;
        let orphan = repo.objects.put_object(&ctx, &Blob::new("orphan").into()).await.unwrap();
        let tree = repo.objects.get_commit(&ctx, &c1).await.unwrap().tree;
        repo.objects.delete(&ctx, &tree).await.unwrap();
        repo.refs.set_reference(&ctx, "refs/heads/main", c1).await.unwrap();

        assert!(collect_garbage(&ctx, &repo, &[], false).await.is_err());
        assert!(repo.objects.exists(&ctx, &orphan).await.unwrap());
    }

    #[tokio::test]
    async fn pinned_objects_survive_sweep() {
        let ctx = OpContext::background();
        let repo = Endpoint::new(Arc::new(InMemoryBlobClient::new()), Namespace::new("b", "r"));
        let c1 = commit_file(&repo.objects, None, "a", "one").await;
        repo.refs.set_reference(&ctx, "refs/heads/main", c1).await.unwrap();
        let staged = repo.objects.put_object(&ctx, &Blob::new("staged").into()).await.unwrap();
        let orphan = repo.objects.put_object(&ctx, &Blob::new("orphan").into()).await.unwrap();

        let report = collect_garbage(&ctx, &repo, &[staged], false).await.unwrap();
        assert_eq!(report.unreachable, vec![orphan]);
        assert_eq!(report.pinned, 1);
        assert!(repo.objects.exists(&ctx, &staged).await.unwrap());
        assert!(!repo.objects.exists(&ctx, &orphan).await.unwrap());
    }
}
