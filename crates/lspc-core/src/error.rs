/// Errors shared by every layer of the LSP client.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("node error: {0}")]
    Node(String),

    #[error("channel information not initialized")]
    NotInitialized,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("malformed payload: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
