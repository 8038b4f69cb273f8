//! Canopy element store

mod store;

pub use store::ElementStore;
