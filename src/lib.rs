pub mod chat;
pub mod error;
pub mod http_client;
pub mod model;
pub mod provider;
pub mod stream;
