use ethereum_types::H256;
use gasbench_rpc::EthClientError;
use gasbench_sdk::{ArtifactError, CalldataEncodeError};

use crate::types::InputShape;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Client(#[from] EthClientError),
    #[error("Node did not answer after {0} connection attempts: {1}")]
    Unreachable(usize, String),
    #[error("No sender configured and the node exposes no unlocked accounts")]
    NoSender,
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Receipt for {0:#x} never showed up")]
    MissingReceipt(H256),
}

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Invalid input size {0}, a batch needs at least one element")]
    InvalidSize(usize),
    #[error("Invalid size range: start {start}, end {end}, step {step}")]
    InvalidSizeRange {
        start: usize,
        end: usize,
        step: usize,
    },
    #[error("Size overrides need start, end and step together")]
    PartialSizeRange,
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Failed to encode call: {0}")]
    Calldata(#[from] CalldataEncodeError),
    #[error("Failed to deploy {contract}: {reason}")]
    Provisioning { contract: String, reason: String },
    #[error("{contract} does not expose {operation}")]
    UnknownOperation { contract: String, operation: String },
    #[error("Gas estimation for {operation} failed: {source}")]
    Estimation {
        operation: String,
        source: LedgerError,
    },
    #[error("Gas budget overflow: estimate {estimate} plus margin {margin}")]
    BudgetOverflow { estimate: u64, margin: u64 },
    #[error(
        "{operation} reverted in transaction {transaction_hash:#x} (gas used {gas_used}, budget {budget})"
    )]
    ExecutionReverted {
        operation: String,
        transaction_hash: H256,
        gas_used: u64,
        budget: u64,
    },
    #[error("{operation} used {gas_used} gas and exhausted its budget of {budget}")]
    BudgetExhausted {
        operation: String,
        gas_used: u64,
        budget: u64,
    },
    #[error(
        "Cannot compare {workload} at size {size}: baseline ran on {baseline}, optimized on {optimized}"
    )]
    IncomparableShapes {
        workload: String,
        size: usize,
        baseline: InputShape,
        optimized: InputShape,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),
}
