//! Storage access and the cleanup pipeline built on top of it.

pub mod bulk_deleter;
pub mod cleanup;
#[cfg(test)]
pub mod memory_store;
pub mod prefix_lister;
pub mod retention;
pub mod s3_client;
pub mod storage_client;
pub mod timestamp_resolver;
