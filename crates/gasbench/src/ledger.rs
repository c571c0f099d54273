//! The execution backend benchmarks run against.
//!
//! Everything above this module talks to a [`Ledger`]; [`NodeLedger`] is the
//! implementation backed by a JSON-RPC development node (Hardhat, Anvil, ...)
//! whose unlocked accounts sign the transactions.

use std::time::Duration;

use bytes::Bytes;
use ethereum_types::{Address, H256};
use gasbench_rpc::{
    EthClient, EthClientError,
    clients::eth::errors::SendTransactionError,
    types::{receipt::RpcReceipt, transaction::TransactionRequest},
};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::LedgerError;

pub const CONNECTION_RETRIES: usize = 5;
pub const CONNECTION_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_RECEIPT_RETRIES: u64 = 120;

/// A transaction as the harness wants it executed. `to == None` creates a
/// contract from `input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: Option<Address>,
    pub input: Bytes,
    pub gas: Option<u64>,
}

impl CallRequest {
    pub fn create(init_code: Bytes) -> Self {
        Self {
            to: None,
            input: init_code,
            gas: None,
        }
    }

    pub fn call(to: Address, input: Bytes) -> Self {
        Self {
            to: Some(to),
            input,
            gas: None,
        }
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: H256,
    pub status: bool,
    pub gas_used: u64,
    pub contract_address: Option<Address>,
}

impl From<RpcReceipt> for Receipt {
    fn from(receipt: RpcReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status,
            gas_used: receipt.gas_used,
            contract_address: receipt.contract_address,
        }
    }
}

#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Cost of `request` if it were executed now. Must not change state.
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, LedgerError>;

    /// Submits `request`. A node refusing the transaction yields
    /// [`LedgerError::Rejected`].
    async fn send_transaction(&self, request: &CallRequest) -> Result<H256, LedgerError>;

    /// Waits for `transaction_hash` to be confirmed. The wait is bounded:
    /// implementations give up with [`LedgerError::MissingReceipt`] once their
    /// polling budget is spent.
    async fn wait_for_receipt(&self, transaction_hash: H256) -> Result<Receipt, LedgerError>;
}

#[derive(Debug, Clone)]
pub struct NodeLedger {
    client: EthClient,
    sender: Address,
    receipt_retries: u64,
}

impl NodeLedger {
    /// Checks the node answers and settles on a sender: `sender` when given, the
    /// node's first unlocked account otherwise.
    pub async fn connect(
        client: EthClient,
        sender: Option<Address>,
        receipt_retries: u64,
    ) -> Result<Self, LedgerError> {
        let chain_id = test_connection(&client).await?;

        let sender = match sender {
            Some(sender) => sender,
            None => client
                .get_accounts()
                .await?
                .first()
                .copied()
                .ok_or(LedgerError::NoSender)?,
        };

        info!(url = %client.url, chain_id, sender = %format!("{sender:#x}"), "Connected to node");

        Ok(Self {
            client,
            sender,
            receipt_retries,
        })
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    fn transaction(&self, request: &CallRequest) -> TransactionRequest {
        let transaction = match request.to {
            Some(to) => TransactionRequest::call(self.sender, to, request.input.clone()),
            None => TransactionRequest::create(self.sender, request.input.clone()),
        };
        match request.gas {
            Some(gas) => transaction.with_gas(gas),
            None => transaction,
        }
    }
}

async fn test_connection(client: &EthClient) -> Result<u64, LedgerError> {
    let mut retry = 1;
    loop {
        match client.get_chain_id().await {
            Ok(chain_id) => break Ok(chain_id),
            Err(err) if retry == CONNECTION_RETRIES => {
                break Err(LedgerError::Unreachable(retry, err.to_string()));
            }
            Err(err) => {
                warn!(
                    "Couldn't establish connection with node: {err}, retrying {retry}/{CONNECTION_RETRIES}"
                );
                sleep(CONNECTION_RETRY_INTERVAL).await;
                retry += 1;
            }
        }
    }
}

#[async_trait::async_trait]
impl Ledger for NodeLedger {
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, LedgerError> {
        Ok(self.client.estimate_gas(&self.transaction(request)).await?)
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<H256, LedgerError> {
        self.client
            .send_transaction(&self.transaction(request))
            .await
            .map_err(|err| match err {
                EthClientError::SendTransactionError(SendTransactionError::RPCError(message)) => {
                    LedgerError::Rejected(message)
                }
                other => other.into(),
            })
    }

    async fn wait_for_receipt(&self, transaction_hash: H256) -> Result<Receipt, LedgerError> {
        self.client
            .wait_for_transaction_receipt(transaction_hash, self.receipt_retries)
            .await
            .map(Receipt::from)
            .map_err(|err| match err {
                EthClientError::ReceiptNotFound(..) => LedgerError::MissingReceipt(transaction_hash),
                other => other.into(),
            })
    }
}
