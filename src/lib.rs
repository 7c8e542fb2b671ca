pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod feed;
pub mod model;
pub mod presenter;
pub mod scorer;
pub mod window;
