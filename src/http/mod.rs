pub mod client;
pub mod error;
pub mod method;
pub mod request;
pub mod response;

pub use client::{Verifier, send};
pub use error::TransportError;
pub use method::HttpMethod;
pub use request::RequestDescription;
pub use response::ResponseSnapshot;
