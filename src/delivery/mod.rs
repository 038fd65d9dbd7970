//! Artifact resolution and delivery negotiation.
//!
//! Bytes are never read here: a [`Delivery`] names a delegation target that
//! an accelerated file server (for example nginx via `X-Accel-Redirect`)
//! resolves on disk.

pub mod negotiate;
mod resolver;

pub use negotiate::{CacheDirectives, Disposition, content_disposition};
pub use resolver::{ArtifactInfo, Delivery, Resolver};
