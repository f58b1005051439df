#![doc = "sftp-bucket-core: core logic library for sftp-bucket."]

//! This crate contains the file grouping, multi-part reassembly and publishing
//! pipeline for sftp-bucket. Remote transfer, secret retrieval and object
//! storage are reached only through the traits in [`contract`]; concrete
//! clients live in the `sftp-bucket` binary crate.
//!
//! # Usage
//! Add this as a dependency for classification, grouping and the batch pipeline.

pub mod classify;
pub mod config;
pub mod contract;
pub mod error;
pub mod grouping;
pub mod pipeline;
pub mod synchronise;
