//! The operation families the harness knows how to benchmark.

use std::{fmt, str::FromStr};

use ethereum_types::{Address, H160, U256};
use gasbench_sdk::Value;
use hex_literal::hex;

use crate::{
    driver::SizeRange,
    error::BenchError,
    generator::InputBatch,
    invoker::GasMargin,
    ledger::Ledger,
    provisioner::{ArtifactStore, Instance, provision},
    types::InputKind,
};

/// Staking token handed to the `MoonStaking` constructor.
pub const STAKING_TOKEN: Address = H160(hex!("1234567890123456789012345678901234567890"));
/// Collection passed to `stake721`.
pub const STAKE_COLLECTION: Address = H160(hex!("1234567890123456789012345678901234567891"));
/// Initial `MockERC20` supply, in ether.
pub const RESCUE_TOKEN_SUPPLY_ETHER: u64 = 1000;

pub const STAKING_GAS_MARGIN: GasMargin = GasMargin(100_000);
pub const PAYEES_GAS_MARGIN: GasMargin = GasMargin(1_000_000);

pub const MOON_STAKING: &str = "MoonStaking";
pub const PAYMENT_SPLITTER: &str = "PaymentSplitter";
pub const MOCK_ERC20: &str = "MockERC20";
pub const SIMPLE_WRITE: &str = "SimpleWrite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workload {
    /// `stake721` over a zero-filled id list (loop-invariant code motion).
    Staking,
    /// `tokenRescue` over a payee list (array length read inside the loop).
    TokenRescue,
    /// `write` over a payee list stored at construction.
    SimpleWrite,
}

/// The instance one scenario calls, plus the arguments its operation is
/// called with. Supporting deployments only surface through `call_args`.
#[derive(Debug, Clone, PartialEq)]
pub struct Provisioned {
    pub target: Instance,
    pub call_args: Vec<Value>,
}

impl Workload {
    pub const ALL: [Workload; 3] = [Workload::Staking, Workload::TokenRescue, Workload::SimpleWrite];

    pub fn name(self) -> &'static str {
        match self {
            Self::Staking => "staking",
            Self::TokenRescue => "token-rescue",
            Self::SimpleWrite => "simple-write",
        }
    }

    /// Base name of the baseline operation.
    pub fn operation(self) -> &'static str {
        match self {
            Self::Staking => "stake721",
            Self::TokenRescue => "tokenRescue",
            Self::SimpleWrite => "write",
        }
    }

    /// Contract the operation is invoked on.
    pub fn target_contract(self) -> &'static str {
        match self {
            Self::Staking => MOON_STAKING,
            Self::TokenRescue => PAYMENT_SPLITTER,
            Self::SimpleWrite => SIMPLE_WRITE,
        }
    }

    /// Every artifact a scenario of this workload deploys.
    pub fn contracts(self) -> &'static [&'static str] {
        match self {
            Self::Staking => &[MOON_STAKING],
            Self::TokenRescue => &[PAYMENT_SPLITTER, MOCK_ERC20],
            Self::SimpleWrite => &[SIMPLE_WRITE],
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            Self::Staking => InputKind::ZeroFilled,
            Self::TokenRescue | Self::SimpleWrite => InputKind::FreshAddress,
        }
    }

    /// Noun used when reporting sizes.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Staking => "elements",
            Self::TokenRescue | Self::SimpleWrite => "payees",
        }
    }

    pub fn default_sizes(self) -> SizeRange {
        match self {
            Self::Staking => SizeRange::STAKING,
            Self::TokenRescue | Self::SimpleWrite => SizeRange::PAYEES,
        }
    }

    pub fn gas_margin(self) -> GasMargin {
        match self {
            Self::Staking => STAKING_GAS_MARGIN,
            Self::TokenRescue | Self::SimpleWrite => PAYEES_GAS_MARGIN,
        }
    }

    /// Deploys fresh instances for one scenario.
    pub async fn provision(
        self,
        ledger: &dyn Ledger,
        artifacts: &ArtifactStore,
        batch: &InputBatch,
    ) -> Result<Provisioned, BenchError> {
        match self {
            Self::Staking => {
                let target = provision(
                    ledger,
                    artifacts.get(MOON_STAKING)?,
                    &[Value::Address(STAKING_TOKEN)],
                )
                .await?;
                Ok(Provisioned {
                    target,
                    call_args: vec![Value::Address(STAKE_COLLECTION), batch.to_abi_array()],
                })
            }
            Self::TokenRescue => {
                let shares = Value::Array(vec![Value::Uint(U256::one()); batch.len()]);
                let target = provision(
                    ledger,
                    artifacts.get(PAYMENT_SPLITTER)?,
                    &[batch.to_abi_array(), shares],
                )
                .await?;
                let token = provision(
                    ledger,
                    artifacts.get(MOCK_ERC20)?,
                    &[Value::Uint(ether(RESCUE_TOKEN_SUPPLY_ETHER))],
                )
                .await?;
                Ok(Provisioned {
                    target,
                    call_args: vec![Value::Address(token.address)],
                })
            }
            Self::SimpleWrite => {
                let target =
                    provision(ledger, artifacts.get(SIMPLE_WRITE)?, &[batch.to_abi_array()])
                        .await?;
                Ok(Provisioned {
                    target,
                    call_args: vec![],
                })
            }
        }
    }
}

fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Workload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|workload| workload.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|w| w.name()).collect();
                format!("unknown workload {s}, expected one of {}", known.join(", "))
            })
    }
}
