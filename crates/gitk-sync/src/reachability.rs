//! Transitive closure of the objects reachable from a commit.

use std::collections::HashSet;

use gitk_store::{Object, OpContext, StoreError, Tree};
use gitk_types::{ObjectId, ObjectKind};
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::source::ObjectSource;

/// Everything reachable from one or more start commits.
///
/// `commits` is newest first along each walked history. `trees` is in
/// post-order, so every subtree appears before the tree that contains it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reachable {
    pub commits: Vec<ObjectId>,
    pub trees: Vec<ObjectId>,
    pub blobs: Vec<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl Reachable {
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.seen.contains(id)
    }

    pub fn contains_commit(&self, id: &ObjectId) -> bool {
        self.commits.contains(id)
    }

    pub fn len(&self) -> usize {
        self.commits.len() + self.trees.len() + self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All identifiers: blobs, then trees, then commits.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectId> {
        self.blobs.iter().chain(&self.trees).chain(&self.commits)
    }
}

/// Walk commit -> tree -> entries -> parent starting at `start`.
pub async fn reachable_from<S>(
    ctx: &OpContext,
    start: ObjectId,
    source: &S,
) -> SyncResult<Reachable>
where
    S: ObjectSource + ?Sized,
{
    let mut walker = Walker::new(source);
    walker.walk(ctx, start).await?;
    Ok(walker.finish())
}

/// Accumulates reachability over several start commits.
///
/// Histories that converge are walked once; a commit met again along the
/// history currently being walked is a cycle.
pub struct Walker<'a, S: ?Sized> {
    source: &'a S,
    reach: Reachable,
}

impl<'a, S: ObjectSource + ?Sized> Walker<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            reach: Reachable::default(),
        }
    }

    pub fn finish(self) -> Reachable {
        self.reach
    }

    pub async fn walk(&mut self, ctx: &OpContext, start: ObjectId) -> SyncResult<()> {
        if self.reach.contains(&start) {
            return Ok(());
        }
        let mut history = HashSet::new();
        let mut from: Option<ObjectId> = None;
        let mut next = Some(start);

        while let Some(id) = next {
            if !history.insert(id) {
                return Err(SyncError::Cycle(id));
            }
            if self.reach.contains(&id) {
                break;
            }
            let commit = match self.load(ctx, from, id).await? {
                Object::Commit(commit) => commit,
                other => {
                    return Err(match from {
                        Some(from) => SyncError::KindMismatch {
                            from,
                            to: id,
                            expected: ObjectKind::Commit,
                            actual: other.kind(),
                        },
                        None => SyncError::NotACommit {
                            id,
                            actual: other.kind(),
                        },
                    })
                }
            };
            self.walk_tree(ctx, id, commit.tree).await?;
            self.reach.seen.insert(id);
            self.reach.commits.push(id);
            from = Some(id);
            next = commit.parent;
        }
        debug!(
            %start,
            commits = self.reach.commits.len(),
            trees = self.reach.trees.len(),
            blobs = self.reach.blobs.len(),
            "walked history"
        );
        Ok(())
    }

    async fn walk_tree(
        &mut self,
        ctx: &OpContext,
        commit: ObjectId,
        root: ObjectId,
    ) -> SyncResult<()> {
        if self.reach.contains(&root) {
            return Ok(());
        }
        let tree = self.load_tree(ctx, commit, root).await?;
        // (tree id, entries, next entry index); the stack is the current path.
        let mut stack: Vec<(ObjectId, Tree, usize)> = vec![(root, tree, 0)];

        while let Some((tree_id, tree, idx)) = stack.last_mut() {
            let tree_id = *tree_id;
            let Some(entry) = tree.entries().get(*idx).cloned() else {
                stack.pop();
                self.reach.seen.insert(tree_id);
                self.reach.trees.push(tree_id);
                continue;
            };
            *idx += 1;

            let target = entry.target;
            match entry.mode.target_kind() {
                ObjectKind::Tree => {
                    if stack.iter().any(|(id, _, _)| *id == target) {
                        return Err(SyncError::Cycle(target));
                    }
                    if self.reach.contains(&target) {
                        continue;
                    }
                    let subtree = self.load_tree(ctx, tree_id, target).await?;
                    stack.push((target, subtree, 0));
                }
                _ => {
                    if self.reach.contains(&target) {
                        continue;
                    }
                    if !self.source.contains(ctx, &target).await? {
                        return Err(SyncError::Dangling {
                            from: tree_id,
                            to: target,
                        });
                    }
                    self.reach.seen.insert(target);
                    self.reach.blobs.push(target);
                }
            }
        }
        Ok(())
    }

    async fn load(
        &self,
        ctx: &OpContext,
        from: Option<ObjectId>,
        id: ObjectId,
    ) -> SyncResult<Object> {
        match self.source.load(ctx, &id).await {
            Ok(object) => Ok(object),
            Err(StoreError::NotFound(_)) if from.is_some() => Err(SyncError::Dangling {
                from: from.unwrap_or(id),
                to: id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_tree(
        &self,
        ctx: &OpContext,
        from: ObjectId,
        id: ObjectId,
    ) -> SyncResult<Tree> {
        match self.load(ctx, Some(from), id).await? {
            Object::Tree(tree) => Ok(tree),
            other => Err(SyncError::KindMismatch {
                from,
                to: id,
                expected: ObjectKind::Tree,
                actual: other.kind(),
            }),
        }
    }
}
