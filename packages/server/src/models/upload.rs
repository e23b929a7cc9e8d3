use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadTargetResponse {
    /// Handle to reference the blob in `CreatePhoto` and on delete.
    pub storage_id: String,
    /// URL to PUT the raw image bytes to, exactly once.
    pub upload_url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlobUploadResponse {
    pub storage_id: String,
    /// Bytes stored.
    pub size: u64,
}
