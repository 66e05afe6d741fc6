pub mod expiry;
pub mod models;
pub mod postgres;
pub mod store;
