//! Writings CRUD endpoints.

use redink_types::{NewWriting, Writing, WritingId, WritingPage, WritingPatch};

use crate::{ApiClient, ApiError};

impl ApiClient {
    /// Fetch one page of the user's writings, newest first. Pages are
    /// 1-based; the server clamps `limit` to its own maximum.
    pub async fn list_writings(&self, page: u32, limit: u32) -> Result<WritingPage, ApiError> {
        let response = self
            .get(&format!("/writings?page={page}&limit={limit}"))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn get_writing(&self, id: WritingId) -> Result<Writing, ApiError> {
        let response = self.get(&format!("/writings/{id}")).send().await?;
        Self::decode(response).await
    }

    /// Create a draft. Validation happens client-side first via
    /// [`NewWriting::validate`]; the server enforces the same bounds and its
    /// rejection decodes here as [`ApiError::Api`].
    pub async fn create_writing(&self, new: &NewWriting) -> Result<Writing, ApiError> {
        let response = self.post("/writings").json(new).send().await?;
        Self::decode(response).await
    }

    /// Update a writing. `patch` carries only the fields to change; omitted
    /// fields keep their server-side value.
    pub async fn update_writing(
        &self,
        id: WritingId,
        patch: &WritingPatch,
    ) -> Result<Writing, ApiError> {
        let response = self
            .put(&format!("/writings/{id}"))
            .json(patch)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_writing(&self, id: WritingId) -> Result<(), ApiError> {
        let response = self.delete(&format!("/writings/{id}")).send().await?;
        Self::expect_success(response).await
    }
}
