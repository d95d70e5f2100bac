//! Parse URLs into their components, mutate them, and join them back into a
//! string.
//!
//! ```
//! use url_components::UrlComponents;
//!
//! let mut url = UrlComponents::from_url("https://example.com/search?q=rust");
//! url.set_scheme(Some("http")).append_to_query("page", "2");
//!
//! assert_eq!(url.to_url_string(), "http://example.com/search?q=rust&page=2");
//! ```

pub mod url_builder;

pub use url_builder::{
    serialize, ComponentValue, QueryMap, QueryPart, QueryValue, UrlComponents, UrlParts,
};
