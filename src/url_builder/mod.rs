//! URL component parsing, mutation and joining.
//!
//! The entry point is [`UrlComponents`]: a value object holding the eight
//! parts of a URL (scheme, host, port, user, pass, path, query, fragment).
//! A record is built from a URL string, from named components, or from
//! request-context values, mutated through chainable setters, and joined
//! back into a URL string.
//!
//! The joining half lives in [`serializer`] as the pure function
//! [`serialize`], which consumes a plain [`UrlParts`] record and is usable
//! without ever constructing a [`UrlComponents`].

pub mod components;
pub mod query;
pub mod serializer;

#[cfg(test)]
mod tests;

pub use components::{ComponentValue, UrlComponents};
pub use query::{QueryMap, QueryValue};
pub use serializer::{serialize, QueryPart, UrlParts};
