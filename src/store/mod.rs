pub mod chain;
pub mod dataset;
pub mod error;
pub mod events;
pub mod lock;
pub mod mosaic;
pub mod page;
pub mod subscription;
pub mod timeline;
pub mod transaction;
pub mod types;
