pub mod aggregator;
pub mod config;
pub mod consumer;
pub mod device;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod metrics;
pub mod metrics_server;
pub mod path;
pub mod processor;
pub mod proto;
pub mod record;
pub mod schema;
pub mod unmarshal;
pub mod wire;
pub mod writer;
