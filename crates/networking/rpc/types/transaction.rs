use bytes::Bytes;
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::serde_utils;

/// Transaction object accepted by `eth_estimateGas`, `eth_call` and
/// `eth_sendTransaction`. A missing `to` means contract creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_utils::quantity::opt"
    )]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "U256::is_zero")]
    pub value: U256,
    #[serde(with = "serde_utils::hex_bytes", alias = "input")]
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn call(from: Address, to: Address, data: Bytes) -> Self {
        Self {
            from,
            to: Some(to),
            data,
            ..Default::default()
        }
    }

    pub fn create(from: Address, init_code: Bytes) -> Self {
        Self {
            from,
            data: init_code,
            ..Default::default()
        }
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}
