use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::{
    types::{receipt::RpcReceipt, transaction::TransactionRequest},
    utils::{RpcErrorResponse, RpcRequest, RpcRequestId, RpcSuccessResponse, parse_json_hex},
};
use errors::{
    EstimateGasError, EthClientError, GetAccountsError, GetChainIdError,
    GetTransactionReceiptError, SendTransactionError,
};
use ethereum_types::{Address, H256};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};

pub mod errors;

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RpcResponse {
    Success(RpcSuccessResponse),
    Error(RpcErrorResponse),
}

#[derive(Debug, Clone)]
pub struct EthClient {
    client: Client,
    pub url: Url,
    pub receipt_poll_interval: Duration,
}

fn next_request_id() -> RpcRequestId {
    RpcRequestId::Number(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Flattens a JSON-RPC error into a single message, keeping revert data when
/// the node sends it.
fn rpc_error_message(error_response: RpcErrorResponse) -> String {
    match error_response.error.data {
        Some(data) => format!("{} (data: {data})", error_response.error.message),
        None => error_response.error.message,
    }
}

impl EthClient {
    pub fn new(url: &str) -> Result<EthClient, EthClientError> {
        let url = Url::parse(url)
            .map_err(|e| EthClientError::ParseUrlError(format!("{url}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            url,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        })
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub async fn send_request(&self, request: RpcRequest) -> Result<RpcResponse, EthClientError> {
        trace!(endpoint = %self.url, ?request, "Sending RPC request");

        let body = serde_json::to_string(&request).map_err(|error| {
            EthClientError::FailedToSerializeRequestBody(format!("{error}: {request:?}"))
        })?;

        let response = self
            .client
            .post(self.url.as_str())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?
            .json::<RpcResponse>()
            .await?;

        if let RpcResponse::Error(err) = &response {
            debug!(endpoint = %self.url, method = %request.method, error = ?err.error, "RPC server returned an error");
        }
        Ok(response)
    }

    pub async fn estimate_gas(&self, transaction: &TransactionRequest) -> Result<u64, EthClientError> {
        let request = RpcRequest::new(
            next_request_id(),
            "eth_estimateGas",
            Some(vec![
                serde_json::to_value(transaction).map_err(EstimateGasError::SerdeJSONError)?,
            ]),
        );

        match self.send_request(request).await? {
            RpcResponse::Success(result) => {
                let res = serde_json::from_value::<String>(result.result)
                    .map_err(EstimateGasError::SerdeJSONError)?;
                let res = res.strip_prefix("0x").ok_or(EstimateGasError::Custom(
                    "Gas estimate is not a 0x prefixed quantity".to_owned(),
                ))?;
                u64::from_str_radix(res, 16)
            }
            .map_err(EstimateGasError::ParseIntError)
            .map_err(EthClientError::from),
            RpcResponse::Error(error_response) => {
                Err(EstimateGasError::RPCError(rpc_error_message(error_response)).into())
            }
        }
    }

    /// Submits a transaction signed by the node (`eth_sendTransaction`). The
    /// `from` account must be unlocked on the node, as dev nodes do for their
    /// funded accounts.
    pub async fn send_transaction(
        &self,
        transaction: &TransactionRequest,
    ) -> Result<H256, EthClientError> {
        let request = RpcRequest::new(
            next_request_id(),
            "eth_sendTransaction",
            Some(vec![
                serde_json::to_value(transaction).map_err(SendTransactionError::SerdeJSONError)?,
            ]),
        );

        match self.send_request(request).await? {
            RpcResponse::Success(result) => serde_json::from_value(result.result)
                .map_err(SendTransactionError::SerdeJSONError)
                .map_err(EthClientError::from),
            RpcResponse::Error(error_response) => {
                Err(SendTransactionError::RPCError(rpc_error_message(error_response)).into())
            }
        }
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<RpcReceipt>, EthClientError> {
        let params = Some(vec![json!(format!("{tx_hash:#x}"))]);
        let request = RpcRequest::new(next_request_id(), "eth_getTransactionReceipt", params);

        match self.send_request(request).await? {
            RpcResponse::Success(result) => serde_json::from_value(result.result)
                .map_err(GetTransactionReceiptError::SerdeJSONError)
                .map_err(EthClientError::from),
            RpcResponse::Error(error_response) => {
                Err(GetTransactionReceiptError::RPCError(rpc_error_message(error_response)).into())
            }
        }
    }

    /// Polls for the receipt of `tx_hash` until it shows up or `max_retries`
    /// polls came back empty.
    pub async fn wait_for_transaction_receipt(
        &self,
        tx_hash: H256,
        max_retries: u64,
    ) -> Result<RpcReceipt, EthClientError> {
        let mut attempt = 1;
        loop {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            if attempt >= max_retries {
                return Err(EthClientError::ReceiptNotFound(
                    format!("{tx_hash:#x}"),
                    max_retries,
                ));
            }
            trace!("[{attempt}/{max_retries}] Retrying to get transaction receipt for {tx_hash:#x}");
            attempt += 1;
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    pub async fn get_accounts(&self) -> Result<Vec<Address>, EthClientError> {
        let request = RpcRequest::new(next_request_id(), "eth_accounts", None);

        match self.send_request(request).await? {
            RpcResponse::Success(result) => serde_json::from_value(result.result)
                .map_err(GetAccountsError::SerdeJSONError)
                .map_err(EthClientError::from),
            RpcResponse::Error(error_response) => {
                Err(GetAccountsError::RPCError(rpc_error_message(error_response)).into())
            }
        }
    }

    pub async fn get_chain_id(&self) -> Result<u64, EthClientError> {
        let request = RpcRequest::new(next_request_id(), "eth_chainId", None);

        match self.send_request(request).await? {
            RpcResponse::Success(result) => parse_json_hex(&result.result)
                .map_err(GetChainIdError::ParseIntError)
                .map_err(EthClientError::from),
            RpcResponse::Error(error_response) => {
                Err(GetChainIdError::RPCError(rpc_error_message(error_response)).into())
            }
        }
    }
}
