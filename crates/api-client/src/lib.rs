pub mod client;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod retry;
pub mod session;

pub use client::{ApiClient, ClientOptions, ImportFile};
pub use dcinv_api;
pub use error::ClientError;
pub use gateway::{Gateway, Replay};
pub use retry::RetryPolicy;
pub use session::{Credentials, MemorySessionStore, Session, SessionStore};
