pub mod error;
pub mod pipeline;
pub mod report;
pub mod staging;
pub mod transformer;

#[cfg(test)]
pub(crate) mod test_utils;
