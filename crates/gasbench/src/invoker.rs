use std::fmt;

use bytes::Bytes;
use ethereum_types::H256;
use gasbench_sdk::{ContractArtifact, Value, encode_calldata};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::BenchError,
    ledger::{CallRequest, Ledger},
    provisioner::Instance,
};

/// Extra gas granted on top of the estimate when submitting an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMargin(pub u64);

impl GasMargin {
    pub fn budget(self, estimate: u64) -> Result<u64, BenchError> {
        estimate
            .checked_add(self.0)
            .ok_or(BenchError::BudgetOverflow {
                estimate,
                margin: self.0,
            })
    }
}

impl fmt::Display for GasMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named contract function with the arguments it will be called with.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationCall {
    pub name: String,
    pub signature: String,
    pub args: Vec<Value>,
}

impl OperationCall {
    /// Resolves `name` against the artifact ABI so the selector matches the
    /// deployed code.
    pub fn from_artifact(
        artifact: &ContractArtifact,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Self, BenchError> {
        if !artifact.has_function(name) {
            return Err(BenchError::UnknownOperation {
                contract: artifact.name.clone(),
                operation: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            signature: artifact.function_signature(name)?,
            args,
        })
    }

    pub fn calldata(&self) -> Result<Bytes, BenchError> {
        Ok(encode_calldata(&self.signature, &self.args)?.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: String,
    pub estimated_gas: u64,
    pub budget: u64,
    pub gas_used: u64,
    pub transaction_hash: H256,
}

/// Estimates, submits with `estimate + margin` as gas limit and waits for the
/// receipt. The realized cost is the receipt's `gas_used`.
pub async fn invoke(
    ledger: &dyn Ledger,
    instance: &Instance,
    call: &OperationCall,
    margin: GasMargin,
) -> Result<Invocation, BenchError> {
    let request = CallRequest::call(instance.address, call.calldata()?);

    let estimated_gas =
        ledger
            .estimate_gas(&request)
            .await
            .map_err(|source| BenchError::Estimation {
                operation: call.name.clone(),
                source,
            })?;
    let budget = margin.budget(estimated_gas)?;
    debug!(
        operation = %call.name,
        contract = %instance.contract,
        estimated_gas,
        budget,
        "Submitting operation"
    );

    let transaction_hash = ledger.send_transaction(&request.with_gas(budget)).await?;
    let receipt = ledger.wait_for_receipt(transaction_hash).await?;

    if !receipt.status {
        return Err(BenchError::ExecutionReverted {
            operation: call.name.clone(),
            transaction_hash,
            gas_used: receipt.gas_used,
            budget,
        });
    }
    if receipt.gas_used >= budget {
        return Err(BenchError::BudgetExhausted {
            operation: call.name.clone(),
            gas_used: receipt.gas_used,
            budget,
        });
    }

    Ok(Invocation {
        operation: call.name.clone(),
        estimated_gas,
        budget,
        gas_used: receipt.gas_used,
        transaction_hash,
    })
}
