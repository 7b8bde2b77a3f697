pub mod adapter;
pub mod encoder;
pub mod row;
pub mod utils;
