pub mod ingest;
pub mod types;
pub mod ws;

pub use ingest::parse_tick_message;
pub use ws::TickFeedClient;
