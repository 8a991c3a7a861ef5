pub mod exporter;
pub mod fetcher;
pub mod metrics;
pub mod pdu;
pub mod server;
