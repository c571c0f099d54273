#[derive(Debug, thiserror::Error)]
pub enum EthClientError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Failed to serialize request body: {0}")]
    FailedToSerializeRequestBody(String),
    #[error("eth_estimateGas request error: {0}")]
    EstimateGasError(#[from] EstimateGasError),
    #[error("eth_sendTransaction request error: {0}")]
    SendTransactionError(#[from] SendTransactionError),
    #[error("eth_getTransactionReceipt request error: {0}")]
    GetTransactionReceiptError(#[from] GetTransactionReceiptError),
    #[error("eth_accounts request error: {0}")]
    GetAccountsError(#[from] GetAccountsError),
    #[error("eth_chainId request error: {0}")]
    GetChainIdError(#[from] GetChainIdError),
    #[error("Transaction receipt for {0} not found after {1} retries")]
    ReceiptNotFound(String, u64),
    #[error("Parse Url Error. {0}")]
    ParseUrlError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EstimateGasError {
    #[error("{0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("{0}")]
    RPCError(String),
    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SendTransactionError {
    #[error("{0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("{0}")]
    RPCError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GetTransactionReceiptError {
    #[error("{0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("{0}")]
    RPCError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GetAccountsError {
    #[error("{0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("{0}")]
    RPCError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GetChainIdError {
    #[error("{0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("{0}")]
    RPCError(String),
    #[error("{0}")]
    ParseIntError(String),
}
