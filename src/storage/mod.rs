//! Storage module for bucket access
//!
//! Wraps an S3-compatible endpoint behind the [`ObjectStore`] trait and
//! exposes pagination-resolved reads through [`BucketReader`].

mod client;
mod reader;
mod s3;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{BucketRef, ObjectSummary};
pub use reader::{BucketReader, ERROR_GENERIC, ERROR_NOT_FOUND};
pub use s3::S3ObjectStore;
