use std::{collections::HashMap, path::Path};

use ethereum_types::Address;
use gasbench_sdk::{ArtifactError, ContractArtifact, Value};
use tracing::{debug, info};

use crate::{
    error::BenchError,
    ledger::{CallRequest, Ledger},
};

/// A deployed contract, owned by exactly one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub contract: String,
    pub address: Address,
}

/// Compiled artifacts, loaded once before the first transaction is sent.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<String, ContractArtifact>,
}

impl ArtifactStore {
    pub fn load<'a>(
        dir: &Path,
        contracts: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ArtifactError> {
        let mut store = Self::default();
        for name in contracts {
            if store.artifacts.contains_key(name) {
                continue;
            }
            store.insert(ContractArtifact::load(dir, name)?);
        }
        Ok(store)
    }

    pub fn from_artifacts(artifacts: impl IntoIterator<Item = ContractArtifact>) -> Self {
        let mut store = Self::default();
        for artifact in artifacts {
            store.insert(artifact);
        }
        store
    }

    pub fn insert(&mut self, artifact: ContractArtifact) {
        self.artifacts.insert(artifact.name.clone(), artifact);
    }

    pub fn get(&self, contract: &str) -> Result<&ContractArtifact, BenchError> {
        self.artifacts.get(contract).ok_or_else(|| BenchError::Provisioning {
            contract: contract.to_string(),
            reason: "no compiled artifact loaded".to_string(),
        })
    }
}

/// Deploys a fresh instance of `artifact`. Never reuses an earlier deployment.
pub async fn provision(
    ledger: &dyn Ledger,
    artifact: &ContractArtifact,
    constructor_args: &[Value],
) -> Result<Instance, BenchError> {
    let contract = artifact.name.clone();
    let failed = |reason: String| BenchError::Provisioning {
        contract: contract.clone(),
        reason,
    };

    let init_code = artifact.init_code(constructor_args)?;
    debug!(contract = %contract, init_code_len = init_code.len(), "Deploying contract");

    let deployment_tx = ledger
        .send_transaction(&CallRequest::create(init_code))
        .await
        .map_err(|e| failed(e.to_string()))?;
    let receipt = ledger
        .wait_for_receipt(deployment_tx)
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !receipt.status {
        return Err(failed(format!(
            "deployment transaction {deployment_tx:#x} reverted"
        )));
    }
    let address = receipt.contract_address.ok_or_else(|| {
        failed(format!(
            "receipt of {deployment_tx:#x} carries no contract address"
        ))
    })?;

    info!(
        contract = %contract,
        address = %format!("{address:#x}"),
        transaction = %format!("{deployment_tx:#x}"),
        gas_used = receipt.gas_used,
        "Contract deployed"
    );

    Ok(Instance {
        contract: artifact.name.clone(),
        address,
    })
}
