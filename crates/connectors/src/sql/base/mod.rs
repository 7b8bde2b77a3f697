pub mod adapter;
pub mod dialect;
pub mod encoder;
pub mod error;
pub mod query;
pub mod requests;
