pub mod clients;
pub mod serde_utils;
pub mod types;
pub mod utils;

pub use clients::{EthClient, EthClientError};
