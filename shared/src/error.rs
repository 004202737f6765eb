#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode value: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to decode stored value: {0}")]
    Deserialize(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("purchase was not persisted: {0}")]
    Persistence(#[from] StorageError),
    #[error("sold boxes could not be read: {0}")]
    SoldUnavailable(#[source] StorageError),
}
