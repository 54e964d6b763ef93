//! Data models for the article processor.
//!
//! `Article` is the persisted entity served by the API. The feed records are
//! transient shapes decoded from the upstream XML.

mod article;
mod feed;

pub use article::*;
pub use feed::*;
