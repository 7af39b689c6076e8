//! Client cart
//!
//! Storefront-local line list persisted under [`CART_KEY`](crate::storage::CART_KEY).

mod cache;

pub use cache::CartCache;
