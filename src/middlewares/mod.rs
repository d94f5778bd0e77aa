pub mod api_key;
pub mod cors;

pub use api_key::*;
pub use cors::*;
