//! Repository consistency check.

use gitk_refs::RefValue;
use gitk_store::OpContext;
use gitk_types::{ErrorKind, ObjectId};
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::reachability::reachable_from;
use crate::types::Endpoint;

/// Problems found by [`verify_repository`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub objects_checked: usize,
    /// Objects that fail re-hashing or decoding.
    pub corrupt: Vec<(ObjectId, String)>,
    /// Direct references whose target object is missing.
    pub dangling_refs: Vec<(String, ObjectId)>,
    /// References whose history cannot be walked.
    pub broken_history: Vec<(String, String)>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.dangling_refs.is_empty() && self.broken_history.is_empty()
    }
}

/// Re-read every object and walk every reference.
///
/// Integrity, decode and graph errors are collected into the report; transport
/// failures and interruptions abort the check.
pub async fn verify_repository(ctx: &OpContext, repo: &Endpoint) -> SyncResult<VerificationReport> {
    let mut report = VerificationReport::default();

    for id in repo.objects.list_all(ctx).await? {
        report.objects_checked += 1;
        match repo.objects.get_object(ctx, &id).await {
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::Integrity | ErrorKind::Decode) => {
                warn!(%id, error = %e, "corrupt object");
                report.corrupt.push((id, e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
    }

    for (name, value) in repo.refs.list_references(ctx).await? {
        let RefValue::Direct(target) = value else {
            continue;
        };
        if !repo.objects.exists(ctx, &target).await? {
            warn!(name, %target, "dangling ref");
            report.dangling_refs.push((name, target));
            continue;
        }
        match reachable_from(ctx, target, &repo.objects).await {
            Ok(_) => {}
            Err(e) if is_finding(&e) => {
                warn!(name, error = %e, "broken history");
                report.broken_history.push((name, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        objects = report.objects_checked,
        corrupt = report.corrupt.len(),
        dangling = report.dangling_refs.len(),
        broken = report.broken_history.len(),
        "verification complete"
    );
    Ok(report)
}

fn is_finding(err: &SyncError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::GraphCorruption
            | ErrorKind::Integrity
            | ErrorKind::Decode
            | ErrorKind::InvalidInput
    )
}
