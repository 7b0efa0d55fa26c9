pub mod config;
pub mod content;
pub mod crypto;
pub mod error;
pub mod license;
pub mod net;
pub mod pipeline;
pub mod resolver;

pub use config::ClientConfig;
pub use error::{DrmError, ErrorKind, Result};
pub use pipeline::{DecryptedPayload, DocumentSession, Pipeline};
pub use resolver::ResolvedType;
