pub mod compare;
pub mod driver;
pub mod error;
pub mod generator;
pub mod invoker;
pub mod ledger;
pub mod provisioner;
pub mod report;
pub mod types;
pub mod workload;

pub use error::{BenchError, LedgerError};
pub use ledger::{CallRequest, Ledger, NodeLedger, Receipt};
