//! Push and fetch: copy a reachability closure, then repoint a reference.

use std::sync::Arc;

use gitk_store::{ObjectStore, OpContext};
use gitk_types::ObjectId;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::reachability::{reachable_from, Reachable};
use crate::types::{
    Endpoint, FetchRequest, FetchResult, PushRequest, PushResult, RefUpdate, TransferStats,
};

enum Copied {
    Uploaded(u64),
    Present,
}

/// Copy every object in `reach` that `to` lacks.
///
/// Blobs go first, then trees (subtrees before parents), then commits
/// (oldest first), so nothing on the receiving side ever references an object
/// that is not yet there. Each phase runs at most `parallelism` copies at once.
pub async fn copy_objects(
    ctx: &OpContext,
    from: &ObjectStore,
    to: &ObjectStore,
    reach: &Reachable,
    parallelism: usize,
) -> SyncResult<TransferStats> {
    let mut stats = TransferStats::default();
    let commits: Vec<ObjectId> = reach.commits.iter().rev().copied().collect();
    for (phase, ids) in [("blobs", &reach.blobs), ("trees", &reach.trees), ("commits", &commits)] {
        let phase_stats = copy_phase(ctx, from, to, ids, parallelism).await?;
        debug!(phase, copied = phase_stats.copied, skipped = phase_stats.skipped, "phase complete");
        stats.copied += phase_stats.copied;
        stats.skipped += phase_stats.skipped;
        stats.bytes += phase_stats.bytes;
    }
    Ok(stats)
}

async fn copy_phase(
    ctx: &OpContext,
    from: &ObjectStore,
    to: &ObjectStore,
    ids: &[ObjectId],
    parallelism: usize,
) -> SyncResult<TransferStats> {
    let permits = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut tasks = JoinSet::new();
    for &id in ids {
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?;
        let (ctx, from, to) = (ctx.clone(), from.clone(), to.clone());
        tasks.spawn(async move {
            let _permit = permit;
            copy_one(&ctx, &from, &to, id).await
        });
    }

    let mut stats = TransferStats::default();
    // Returning early drops the set, which aborts the copies still running.
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(|e| SyncError::Task(e.to_string()))?? {
            Copied::Uploaded(bytes) => {
                stats.copied += 1;
                stats.bytes += bytes;
            }
            Copied::Present => stats.skipped += 1,
        }
    }
    Ok(stats)
}

async fn copy_one(
    ctx: &OpContext,
    from: &ObjectStore,
    to: &ObjectStore,
    id: ObjectId,
) -> SyncResult<Copied> {
    if to.exists(ctx, &id).await? {
        return Ok(Copied::Present);
    }
    let (kind, content) = from.get(ctx, &id).await?;
    to.put(ctx, kind, &content).await?;
    debug!(%id, %kind, "copied object");
    Ok(Copied::Uploaded(content.len() as u64))
}

/// Copy the closure of `request.source_ref` to `destination`, then repoint
/// `request.dest_ref`.
///
/// Any failure returns before the reference is touched. Without `force`, the
/// current destination value must be an ancestor of the pushed commit, and
/// the final update is conditional on that value being unchanged.
pub async fn push(
    ctx: &OpContext,
    source: &Endpoint,
    destination: &Endpoint,
    request: &PushRequest,
) -> SyncResult<PushResult> {
    let new = source.refs.get_reference(ctx, &request.source_ref).await?;
    let old = destination.refs.try_get_reference(ctx, &request.dest_ref).await?;
    let update = RefUpdate {
        name: request.dest_ref.clone(),
        old,
        new,
    };
    if update.is_noop() {
        info!(name = %update.name, %new, "destination up to date");
        return Ok(PushResult {
            update,
            stats: TransferStats::default(),
            forced: false,
        });
    }

    let reach = reachable_from(ctx, new, &source.objects).await?;
    let fast_forward = old.map_or(true, |current| reach.contains_commit(&current));
    if !fast_forward && !request.force {
        return Err(SyncError::NotFastForward {
            name: request.dest_ref.clone(),
            current: old.unwrap_or(new),
            proposed: new,
        });
    }

    let stats = copy_objects(
        ctx,
        &source.objects,
        &destination.objects,
        &reach,
        request.parallelism,
    )
    .await?;

    if request.force {
        destination.refs.set_reference(ctx, &request.dest_ref, new).await?;
    } else {
        destination
            .refs
            .update_reference_if(ctx, &request.dest_ref, old, new)
            .await?;
    }
    info!(
        name = %request.dest_ref,
        %new,
        copied = stats.copied,
        skipped = stats.skipped,
        forced = !fast_forward,
        "push complete"
    );
    Ok(PushResult {
        update,
        stats,
        forced: !fast_forward,
    })
}

/// Copy the closure of `request.remote_ref` into `local`, then set
/// `request.local_ref` to it.
pub async fn fetch(
    ctx: &OpContext,
    remote: &Endpoint,
    local: &Endpoint,
    request: &FetchRequest,
) -> SyncResult<FetchResult> {
    let new = remote.refs.get_reference(ctx, &request.remote_ref).await?;
    let old = local.refs.try_get_reference(ctx, &request.local_ref).await?;
    let update = RefUpdate {
        name: request.local_ref.clone(),
        old,
        new,
    };

    let reach = reachable_from(ctx, new, &remote.objects).await?;
    let stats =
        copy_objects(ctx, &remote.objects, &local.objects, &reach, request.parallelism).await?;
    if !update.is_noop() {
        local.refs.set_reference(ctx, &request.local_ref, new).await?;
    }
    info!(name = %request.local_ref, %new, copied = stats.copied, "fetch complete");
    Ok(FetchResult { update, stats })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gitk_store::{InMemoryBlobClient, Namespace};
    use gitk_types::ErrorKind;

    use super::*;
    use crate::reachability::tests::commit_file;

    const MAIN: &str = "refs/heads/main";

    fn endpoint(bucket: &str) -> (Arc<InMemoryBlobClient>, Endpoint) {
        let client = Arc::new(InMemoryBlobClient::new());
        let endpoint = Endpoint::new(client.clone(), Namespace::new(bucket, "repo"));
        (client, endpoint)
    }

    async fn local_with_chain(n: usize) -> (Endpoint, Vec<ObjectId>) {
        let (_, local) = endpoint("local");
        let ctx = OpContext::background();
        let mut ids = Vec::new();
        let mut parent = None;
        for i in 0..n {
            let id = commit_file(&local.objects, parent, "file.txt", &format!("v{i}")).await;
            ids.push(id);
            parent = Some(id);
        }
        if let Some(tip) = ids.last() {
            local.refs.set_reference(&ctx, MAIN, *tip).await.unwrap();
        }
        (local, ids)
    }

    #[tokio::test]
    async fn push_to_empty_destination() {
        let ctx = OpContext::background();
        let (local, chain) = local_with_chain(2).await;
        let (_, remote) = endpoint("remote");

        let result = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap();
        assert_eq!(result.update.old, None);
        assert_eq!(result.update.new, chain[1]);
        assert_eq!(result.stats.copied, 6);
        assert!(!result.forced);

        assert_eq!(remote.refs.get_reference(&ctx, MAIN).await.unwrap(), chain[1]);
        for id in remote.objects.list_all(&ctx).await.unwrap() {
            assert!(local.objects.exists(&ctx, &id).await.unwrap());
        }
        assert_eq!(remote.objects.list_all(&ctx).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn push_copies_only_missing_objects() {
        let ctx = OpContext::background();
        let (local, chain) = local_with_chain(1).await;
        let (remote_client, remote) = endpoint("remote");
        push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap();

        let c2 = commit_file(&local.objects, Some(chain[0]), "file.txt", "next").await;
        local.refs.set_reference(&ctx, MAIN, c2).await.unwrap();
        let before = remote_client.upload_count();
        let result = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap();
        assert_eq!(result.stats.copied, 3);
        assert_eq!(result.stats.skipped, 3);
        // three objects plus the ref
        assert_eq!(remote_client.upload_count() - before, 4);
    }

    #[tokio::test]
    async fn failed_upload_leaves_destination_ref_unchanged() {
        let ctx = OpContext::background();
        let (local, _) = local_with_chain(1).await;
        let (remote_client, remote) = endpoint("remote");
        remote_client.fail_upload(2);

        let err = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(remote.refs.try_read_reference(&ctx, MAIN).await.unwrap().is_none());
        assert_eq!(remote_client.upload_count(), 2);
    }

    #[tokio::test]
    async fn failed_upload_keeps_prior_value() {
        let ctx = OpContext::background();
        let (local, chain) = local_with_chain(1).await;
        let (remote_client, remote) = endpoint("remote");
        push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap();
        assert_eq!(remote_client.upload_count(), 4);

        let c2 = commit_file(&local.objects, Some(chain[0]), "file.txt", "next").await;
        local.refs.set_reference(&ctx, MAIN, c2).await.unwrap();
        remote_client.fail_upload(6);
        assert!(push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.is_err());
        assert_eq!(remote.refs.get_reference(&ctx, MAIN).await.unwrap(), chain[0]);
        assert!(!remote.objects.exists(&ctx, &c2).await.unwrap());
    }

    #[tokio::test]
    async fn non_fast_forward_rejected_unless_forced() {
        let ctx = OpContext::background();
        let (local, chain) = local_with_chain(1).await;
        let (_, remote) = endpoint("remote");
        let diverged = commit_file(&remote.objects, None, "other.txt", "theirs").await;
        remote.refs.set_reference(&ctx, MAIN, diverged).await.unwrap();

        let err = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFastForward { current, .. } if current == diverged));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(remote.refs.get_reference(&ctx, MAIN).await.unwrap(), diverged);

        let result = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN).force(true))
            .await
            .unwrap();
        assert!(result.forced);
        assert_eq!(remote.refs.get_reference(&ctx, MAIN).await.unwrap(), chain[0]);
    }

    #[tokio::test]
    async fn push_up_to_date_is_noop() {
        let ctx = OpContext::background();
        let (local, _) = local_with_chain(1).await;
        let (remote_client, remote) = endpoint("remote");
        push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap();
        let before = remote_client.upload_count();
        let result = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap();
        assert!(result.update.is_noop());
        assert_eq!(remote_client.upload_count(), before);
    }

    #[tokio::test]
    async fn push_with_unit_parallelism() {
        let ctx = OpContext::background();
        let (local, chain) = local_with_chain(3).await;
        let (_, remote) = endpoint("remote");
        push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN).parallelism(1))
            .await
            .unwrap();
        assert_eq!(remote.refs.get_reference(&ctx, MAIN).await.unwrap(), chain[2]);
    }

    #[tokio::test]
    async fn fetch_sets_tracking_ref() {
        let ctx = OpContext::background();
        let (remote, chain) = local_with_chain(2).await;
        let (_, local) = endpoint("mine");
        let tracking = "refs/remotes/origin/main";

        let request = FetchRequest::new(MAIN, tracking);
        let result = fetch(&ctx, &remote, &local, &request).await.unwrap();
        assert_eq!(result.stats.copied, 6);
        assert_eq!(local.refs.get_reference(&ctx, tracking).await.unwrap(), chain[1]);
        assert!(local.refs.try_read_reference(&ctx, MAIN).await.unwrap().is_none());

        let again = fetch(&ctx, &remote, &local, &FetchRequest::new(MAIN, tracking)).await.unwrap();
        assert_eq!(again.stats.copied, 0);
        assert!(again.update.is_noop());
    }

    #[tokio::test]
    async fn cancelled_push_does_not_move_ref() {
        let (local, _) = local_with_chain(1).await;
        let (_, remote) = endpoint("remote");
        let ctx = OpContext::background();
        ctx.cancel();
        let err = push(&ctx, &local, &remote, &PushRequest::new(MAIN, MAIN)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        let live = OpContext::background();
        assert!(remote.refs.try_read_reference(&live, MAIN).await.unwrap().is_none());
    }
}
