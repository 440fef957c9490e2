// Client resource orchestration across the store, cache and blob storage

pub mod clients;

pub use clients::*;
