// Built-in providers (always available)
pub mod http;
pub mod static_catalog;

pub use http::{HttpProvider, HttpProviderConfig};
pub use static_catalog::{Catalog, CatalogEntry, StaticProvider};
