pub mod crypto;
pub mod http;
pub mod types;
