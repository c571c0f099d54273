use ethereum_types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::serde_utils;

/// The subset of an `eth_getTransactionReceipt` result the benchmarks rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: H256,
    #[serde(default, with = "serde_utils::quantity::opt")]
    pub block_number: Option<u64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(with = "serde_utils::status")]
    pub status: bool,
    #[serde(with = "serde_utils::quantity")]
    pub gas_used: u64,
    #[serde(with = "serde_utils::quantity")]
    pub cumulative_gas_used: u64,
    #[serde(default, with = "serde_utils::quantity::opt")]
    pub effective_gas_price: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOY_RECEIPT: &str = r#"{
        "transactionHash": "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
        "transactionIndex": "0x0",
        "blockHash": "0x1d59ff54b1eb26b013ce3cb5fc9dab3705b415a67127a003c3e61eb445bb8df2",
        "blockNumber": "0x3",
        "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        "to": null,
        "cumulativeGasUsed": "0x7a9c1",
        "gasUsed": "0x7a9c1",
        "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
        "logs": [],
        "logsBloom": "0x00",
        "type": "0x2",
        "status": "0x1",
        "effectiveGasPrice": "0x3b9aca00"
    }"#;

    #[test]
    fn deserialize_deployment_receipt() {
        let receipt: RpcReceipt = serde_json::from_str(DEPLOY_RECEIPT).unwrap();
        assert!(receipt.status);
        assert_eq!(receipt.gas_used, 502_209);
        assert_eq!(receipt.block_number, Some(3));
        assert_eq!(receipt.to, None);
        assert_eq!(
            receipt.contract_address,
            Some("0x5fbdb2315678afecb367f032d93f642f64180aa3".parse().unwrap())
        );
    }

    #[test]
    fn deserialize_reverted_receipt() {
        let reverted = DEPLOY_RECEIPT.replace(r#""status": "0x1""#, r#""status": "0x0""#);
        let receipt: RpcReceipt = serde_json::from_str(&reverted).unwrap();
        assert!(!receipt.status);
    }
}
