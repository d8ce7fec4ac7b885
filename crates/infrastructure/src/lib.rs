//! Infrastructure adapters: the reqwest transport, the bearer-attaching
//! transport decorator, and the in-memory token store.

#![forbid(unsafe_code)]

mod memory_token_store;
mod reqwest_http_transport;
mod token_attaching_transport;

pub use memory_token_store::{InMemoryTokenStore, TokenCallback};
pub use reqwest_http_transport::ReqwestHttpTransport;
pub use token_attaching_transport::{GlobalTokenProvider, TokenAttachingTransport};
