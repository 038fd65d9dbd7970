pub mod dto;
mod files;
mod index;
pub mod response;
mod router;
pub mod validation;

pub use router::{AppState, create_router};
