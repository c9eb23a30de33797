use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MindError, MindResult};
use crate::types::{Analysis, Documentation, Review};

/// AI collaborator consulted only on explicit opt-in.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Suggest a commit message for a change summary.
    async fn generate_commit_message(&self, diff: &str) -> MindResult<String>;

    async fn review_code(&self, diff: &str) -> MindResult<Review>;

    async fn analyze_repository(&self, path: &str) -> MindResult<Analysis>;

    async fn generate_documentation(&self, path: &str) -> MindResult<Documentation>;
}

#[async_trait]
impl<T: Assistant + ?Sized> Assistant for Arc<T> {
    async fn generate_commit_message(&self, diff: &str) -> MindResult<String> {
        (**self).generate_commit_message(diff).await
    }

    async fn review_code(&self, diff: &str) -> MindResult<Review> {
        (**self).review_code(diff).await
    }

    async fn analyze_repository(&self, path: &str) -> MindResult<Analysis> {
        (**self).analyze_repository(path).await
    }

    async fn generate_documentation(&self, path: &str) -> MindResult<Documentation> {
        (**self).generate_documentation(path).await
    }
}

/// Assistant with canned answers, for tests and offline use.
#[derive(Clone, Debug, Default)]
pub struct StaticAssistant {
    pub commit_message: Option<String>,
    pub review: Review,
    pub analysis: Analysis,
    pub documentation: Documentation,
}

impl StaticAssistant {
    pub fn with_commit_message(message: impl Into<String>) -> Self {
        Self {
            commit_message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Assistant for StaticAssistant {
    async fn generate_commit_message(&self, _diff: &str) -> MindResult<String> {
        self.commit_message
            .clone()
            .ok_or_else(|| MindError::Unavailable("no commit message configured".into()))
    }

    async fn review_code(&self, _diff: &str) -> MindResult<Review> {
        Ok(self.review.clone())
    }

    async fn analyze_repository(&self, _path: &str) -> MindResult<Analysis> {
        Ok(self.analysis.clone())
    }

    async fn generate_documentation(&self, _path: &str) -> MindResult<Documentation> {
        Ok(self.documentation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_assistant_answers() {
        let assistant: Arc<dyn Assistant> =
            Arc::new(StaticAssistant::with_commit_message("Add file"));
        assert_eq!(assistant.generate_commit_message("A file.txt").await.unwrap(), "Add file");
        assert!(assistant.review_code("").await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_message_is_unavailable() {
        let err = StaticAssistant::default()
            .generate_commit_message("diff")
            .await
            .unwrap_err();
        assert!(matches!(err, MindError::Unavailable(_)));
    }
}
