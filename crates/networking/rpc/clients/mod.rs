pub mod eth;

pub use eth::{EthClient, errors::EthClientError};
