pub mod cli;
pub mod client;
pub mod config;
pub mod dated;
pub mod error;
pub mod models;
pub mod storage;
pub mod util;

pub use crate::{
    client::ObjectStoreClient,
    config::Config,
    error::StoreError,
    models::{ListingEntry, ObjectRef, Payload, PutReceipt},
    storage::{memory::MemoryStore, s3::S3Store, ObjectBody, ObjectStore},
};

pub use cli::run;

pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
