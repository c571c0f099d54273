//! In-memory ledger for driving the harness without a node.
//!
//! Gas model: a call costs the intrinsic 21000, plus calldata gas, plus a
//! per-word cost for every calldata word and every constructor word of the
//! target, plus a one-off first-touch surcharge the first time an instance is
//! called. Estimates never change state.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use bytes::Bytes;
use ethereum_types::{Address, H256};
use gasbench::{
    CallRequest, Ledger, LedgerError, Receipt, provisioner::ArtifactStore, types::CostObservation,
};
use gasbench_sdk::ContractArtifact;
use keccak_hash::keccak;

pub const BYTECODE_LEN: usize = 2;
pub const DEFAULT_WORD_COST: u64 = 5_000;
pub const FIRST_TOUCH_SURCHARGE: u64 = 20_000;
/// Creation code starting with this byte makes the deployment revert.
pub const REVERTING_CREATION: u8 = 0xfe;

#[derive(Debug, Clone)]
pub struct Deployment {
    pub address: Address,
    pub init_code: Bytes,
}

#[derive(Debug)]
struct Contract {
    constructor_words: u64,
    touched: bool,
}

#[derive(Debug, Default)]
struct Inner {
    next_contract: u64,
    next_transaction: u64,
    contracts: HashMap<Address, Contract>,
    receipts: HashMap<H256, Receipt>,
    deployments: Vec<Deployment>,
    sent: Vec<CallRequest>,
    estimates: usize,
    word_costs: HashMap<[u8; 4], u64>,
    reverting: HashSet<[u8; 4]>,
    estimate_shortfall: u64,
}

#[derive(Debug, Default)]
pub struct ScriptedLedger {
    inner: Mutex<Inner>,
}

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

fn calldata_gas(input: &[u8]) -> u64 {
    input
        .iter()
        .map(|byte| if *byte == 0 { 4 } else { 16 })
        .sum()
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-word execution cost of calls to `signature`.
    pub fn with_word_cost(self, signature: &str, cost: u64) -> Self {
        self.lock().word_costs.insert(selector(signature), cost);
        self
    }

    /// Calls to `signature` revert; their estimates fail like a node's would.
    pub fn reverting(self, signature: &str) -> Self {
        self.lock().reverting.insert(selector(signature));
        self
    }

    /// Estimates come back `shortfall` gas below the real cost.
    pub fn with_estimate_shortfall(self, shortfall: u64) -> Self {
        self.lock().estimate_shortfall = shortfall;
        self
    }

    pub fn deployments(&self) -> Vec<Deployment> {
        self.lock().deployments.clone()
    }

    pub fn sent(&self) -> Vec<CallRequest> {
        self.lock().sent.clone()
    }

    pub fn estimates(&self) -> usize {
        self.lock().estimates
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Inner {
    fn execution_cost(&self, to: Address, input: &[u8]) -> Result<u64, String> {
        let contract = self
            .contracts
            .get(&to)
            .ok_or_else(|| format!("no contract at {to:#x}"))?;
        if input.len() < 4 {
            return Err("missing selector".to_string());
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&input[..4]);
        if self.reverting.contains(&selector) {
            return Err("execution reverted".to_string());
        }

        let word_cost = self
            .word_costs
            .get(&selector)
            .copied()
            .unwrap_or(DEFAULT_WORD_COST);
        let words = ((input.len() - 4) / 32) as u64 + contract.constructor_words;
        let surcharge = if contract.touched {
            0
        } else {
            FIRST_TOUCH_SURCHARGE
        };
        Ok(21_000 + calldata_gas(input) + word_cost * words + surcharge)
    }

    fn next_hash(&mut self) -> H256 {
        self.next_transaction += 1;
        H256::from_low_u64_be(self.next_transaction)
    }

    fn deploy(&mut self, init_code: &Bytes) -> Receipt {
        let transaction_hash = self.next_hash();
        let gas_used = 100_000 + 200 * init_code.len() as u64;

        if init_code.first() == Some(&REVERTING_CREATION) {
            return Receipt {
                transaction_hash,
                status: false,
                gas_used,
                contract_address: None,
            };
        }

        self.next_contract += 1;
        let address = Address::from_low_u64_be(0xc0de_0000 + self.next_contract);
        let constructor_words = (init_code.len().saturating_sub(BYTECODE_LEN) / 32) as u64;
        self.contracts.insert(
            address,
            Contract {
                constructor_words,
                touched: false,
            },
        );
        self.deployments.push(Deployment {
            address,
            init_code: init_code.clone(),
        });

        Receipt {
            transaction_hash,
            status: true,
            gas_used,
            contract_address: Some(address),
        }
    }

    fn call(&mut self, to: Address, request: &CallRequest) -> Receipt {
        let transaction_hash = self.next_hash();
        let limit = request.gas.unwrap_or(u64::MAX);
        let (status, gas_used) = match self.execution_cost(to, &request.input) {
            Ok(cost) if cost <= limit => (true, cost),
            Ok(_) => (false, limit),
            Err(_) => (false, 21_000 + calldata_gas(&request.input)),
        };
        if status {
            if let Some(contract) = self.contracts.get_mut(&to) {
                contract.touched = true;
            }
        }

        Receipt {
            transaction_hash,
            status,
            gas_used,
            contract_address: None,
        }
    }
}

#[async_trait::async_trait]
impl Ledger for ScriptedLedger {
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, LedgerError> {
        let mut inner = self.lock();
        inner.estimates += 1;
        let to = request
            .to
            .ok_or_else(|| LedgerError::Rejected("creation estimates are not scripted".into()))?;
        let cost = inner
            .execution_cost(to, &request.input)
            .map_err(LedgerError::Rejected)?;
        Ok(cost.saturating_sub(inner.estimate_shortfall))
    }

    async fn send_transaction(&self, request: &CallRequest) -> Result<H256, LedgerError> {
        let mut inner = self.lock();
        inner.sent.push(request.clone());
        let receipt = match request.to {
            Some(to) => inner.call(to, request),
            None => inner.deploy(&request.input),
        };
        let transaction_hash = receipt.transaction_hash;
        inner.receipts.insert(transaction_hash, receipt);
        Ok(transaction_hash)
    }

    async fn wait_for_receipt(&self, transaction_hash: H256) -> Result<Receipt, LedgerError> {
        self.lock()
            .receipts
            .get(&transaction_hash)
            .cloned()
            .ok_or(LedgerError::MissingReceipt(transaction_hash))
    }
}

fn artifact(name: &str, bytecode: &str, abi: &str) -> ContractArtifact {
    let json = format!(r#"{{"contractName": "{name}", "abi": {abi}, "bytecode": "{bytecode}"}}"#);
    ContractArtifact::from_hardhat_json(name, &json).unwrap()
}

fn function(name: &str, inputs: &[(&str, &str)]) -> String {
    let inputs: Vec<String> = inputs
        .iter()
        .map(|(name, kind)| format!(r#"{{"name": "{name}", "type": "{kind}"}}"#))
        .collect();
    format!(
        r#"{{"type": "function", "name": "{name}", "inputs": [{}], "outputs": [], "stateMutability": "nonpayable"}}"#,
        inputs.join(", ")
    )
}

fn constructor(inputs: &[(&str, &str)]) -> String {
    let inputs: Vec<String> = inputs
        .iter()
        .map(|(name, kind)| format!(r#"{{"name": "{name}", "type": "{kind}"}}"#))
        .collect();
    format!(
        r#"{{"type": "constructor", "inputs": [{}], "stateMutability": "nonpayable"}}"#,
        inputs.join(", ")
    )
}

fn abi(entries: &[String]) -> String {
    format!("[{}]", entries.join(", "))
}

pub fn moon_staking() -> ContractArtifact {
    let stake_inputs = [("collection", "address"), ("tokenIds", "uint256[]")];
    artifact(
        "MoonStaking",
        "0x6001",
        &abi(&[
            constructor(&[("token", "address")]),
            function("stake721", &stake_inputs),
            function("stake721_optimized", &stake_inputs),
        ]),
    )
}

pub fn payment_splitter() -> ContractArtifact {
    artifact(
        "PaymentSplitter",
        "0x6002",
        &abi(&[
            constructor(&[("payees", "address[]"), ("shares", "uint256[]")]),
            function("tokenRescue", &[("token", "address")]),
            function("tokenRescue_optimized", &[("token", "address")]),
        ]),
    )
}

pub fn mock_erc20() -> ContractArtifact {
    artifact(
        "MockERC20",
        "0x6003",
        &abi(&[
            constructor(&[("initialSupply", "uint256")]),
            function("transfer", &[("to", "address"), ("amount", "uint256")]),
        ]),
    )
}

pub fn simple_write() -> ContractArtifact {
    artifact(
        "SimpleWrite",
        "0x6004",
        &abi(&[
            constructor(&[("accounts", "address[]")]),
            function("write", &[]),
            function("write_optimized", &[]),
        ]),
    )
}

/// `SimpleWrite` compiled without its optimized variant.
pub fn simple_write_baseline_only() -> ContractArtifact {
    artifact(
        "SimpleWrite",
        "0x6004",
        &abi(&[constructor(&[("accounts", "address[]")]), function("write", &[])]),
    )
}

/// `SimpleWrite` whose creation code reverts.
pub fn simple_write_reverting_constructor() -> ContractArtifact {
    artifact(
        "SimpleWrite",
        "0xfe04",
        &abi(&[
            constructor(&[("accounts", "address[]")]),
            function("write", &[]),
            function("write_optimized", &[]),
        ]),
    )
}

/// Sink keeping every observation in memory.
pub fn recorder() -> Vec<CostObservation> {
    Vec::new()
}

pub fn artifacts() -> ArtifactStore {
    ArtifactStore::from_artifacts([moon_staking(), payment_splitter(), mock_erc20(), simple_write()])
}

/// Addresses of a single `address[]` constructor argument (first argument).
pub fn constructor_addresses(init_code: &[u8]) -> Vec<Address> {
    let args = &init_code[BYTECODE_LEN..];
    let offset = word_as_usize(&args[..32]);
    let len = word_as_usize(&args[offset..offset + 32]);
    (0..len)
        .map(|i| {
            let start = offset + 32 + i * 32;
            Address::from_slice(&args[start + 12..start + 32])
        })
        .collect()
}

fn word_as_usize(word: &[u8]) -> usize {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..32]);
    u64::from_be_bytes(bytes) as usize
}
