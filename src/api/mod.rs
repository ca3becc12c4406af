//! The API layer, containing web handlers and routing.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;

pub use error::{error_body, status_for};
pub use extract::{JsonBody, PathParam, QueryParams, REQUEST_ID_HEADER};
pub use handlers::ApiDoc;
pub use router::create_router;
