//! restmeta Core Library
//!
//! This library turns a declaration tree of decorated service classes into
//! normalized API metadata (controllers, operations, parameters, responses
//! and referenced models) ready for an OpenAPI document renderer.

pub mod config;
pub mod decorators;
pub mod error;
pub mod metadata;
pub mod path;
pub mod syntax;

pub use crate::{
    config::Config,
    error::{Error, Result},
    metadata::{Metadata, MetadataGenerator},
    syntax::Program,
};
