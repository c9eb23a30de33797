use async_trait::async_trait;
use gitk_store::{Object, ObjectStore, OpContext, StoreResult};
use gitk_types::ObjectId;

/// Read side of an object graph walk.
///
/// [`ObjectStore`] is the production implementation; the walk only needs to
/// decode objects and probe for existence.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn load(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Object>;

    async fn contains(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<bool>;
}

#[async_trait]
impl ObjectSource for ObjectStore {
    async fn load(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<Object> {
        self.get_object(ctx, id).await
    }

    async fn contains(&self, ctx: &OpContext, id: &ObjectId) -> StoreResult<bool> {
        self.exists(ctx, id).await
    }
}
