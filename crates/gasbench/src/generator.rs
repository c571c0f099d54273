use std::collections::HashSet;

use ethereum_types::{Address, U256};
use gasbench_sdk::{Value, keys::random_address};
use rand::{SeedableRng, rngs::StdRng};
use tracing::trace;

use crate::{
    error::BenchError,
    types::{InputKind, InputShape},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputValue {
    Zero,
    Address(Address),
}

/// An ordered, non-empty list of values of a single kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBatch {
    kind: InputKind,
    values: Vec<InputValue>,
}

impl InputBatch {
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[InputValue] {
        &self.values
    }

    pub fn shape(&self) -> InputShape {
        InputShape {
            kind: self.kind,
            len: self.values.len(),
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.values
            .iter()
            .filter_map(|value| match value {
                InputValue::Address(address) => Some(*address),
                InputValue::Zero => None,
            })
            .collect()
    }

    /// `uint256[]` for zero-filled batches, `address[]` for address batches.
    pub fn to_abi_array(&self) -> Value {
        Value::Array(
            self.values
                .iter()
                .map(|value| match value {
                    InputValue::Zero => Value::Uint(U256::zero()),
                    InputValue::Address(address) => Value::Address(*address),
                })
                .collect(),
        )
    }
}

/// Produces input batches. Fresh addresses are never handed out twice by the
/// same generator.
#[derive(Debug)]
pub struct InputGenerator {
    rng: StdRng,
    issued: HashSet<Address>,
}

impl Default for InputGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InputGenerator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    pub fn generate(&mut self, size: usize, kind: InputKind) -> Result<InputBatch, BenchError> {
        if size == 0 {
            return Err(BenchError::InvalidSize(size));
        }

        let values = match kind {
            InputKind::ZeroFilled => vec![InputValue::Zero; size],
            InputKind::FreshAddress => (0..size)
                .map(|_| InputValue::Address(self.fresh_address()))
                .collect(),
        };

        trace!(size, %kind, "Generated input batch");
        Ok(InputBatch { kind, values })
    }

    pub fn fresh_address(&mut self) -> Address {
        loop {
            let address = random_address(&mut self.rng);
            if self.issued.insert(address) {
                return address;
            }
        }
    }

    /// Number of distinct addresses handed out so far.
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_filled_batch_has_requested_length() {
        let mut generator = InputGenerator::from_seed(1);

        let batch = generator.generate(100, InputKind::ZeroFilled).unwrap();

        assert_eq!(batch.len(), 100);
        assert!(batch.values().iter().all(|value| *value == InputValue::Zero));
        assert_eq!(
            batch.shape(),
            InputShape {
                kind: InputKind::ZeroFilled,
                len: 100
            }
        );
        assert_eq!(generator.issued(), 0);
    }

    #[test]
    fn single_element_batches_are_valid() {
        let mut generator = InputGenerator::from_seed(1);

        assert_eq!(generator.generate(1, InputKind::ZeroFilled).unwrap().len(), 1);
        assert_eq!(generator.generate(1, InputKind::FreshAddress).unwrap().len(), 1);
    }

    #[test]
    fn size_zero_is_rejected() {
        let mut generator = InputGenerator::from_seed(1);

        for kind in [InputKind::ZeroFilled, InputKind::FreshAddress] {
            assert!(matches!(
                generator.generate(0, kind),
                Err(BenchError::InvalidSize(0))
            ));
        }
    }

    #[test]
    fn fresh_addresses_are_unique_across_batches() {
        let mut generator = InputGenerator::from_seed(42);
        let mut seen = HashSet::new();

        for size in [100, 200, 300] {
            let batch = generator.generate(size, InputKind::FreshAddress).unwrap();
            for address in batch.addresses() {
                assert!(seen.insert(address), "address {address:#x} issued twice");
            }
        }

        assert_eq!(seen.len(), 600);
        assert_eq!(generator.issued(), 600);
        assert!(!seen.contains(&Address::zero()));
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let mut a = InputGenerator::from_seed(7);
        let mut b = InputGenerator::from_seed(7);

        assert_eq!(
            a.generate(10, InputKind::FreshAddress).unwrap(),
            b.generate(10, InputKind::FreshAddress).unwrap()
        );
    }

    #[test]
    fn batches_convert_to_abi_arrays() {
        let mut generator = InputGenerator::from_seed(3);

        let zeros = generator.generate(2, InputKind::ZeroFilled).unwrap();
        assert_eq!(
            zeros.to_abi_array(),
            Value::Array(vec![Value::Uint(U256::zero()), Value::Uint(U256::zero())])
        );

        let addresses = generator.generate(2, InputKind::FreshAddress).unwrap();
        let expected = addresses
            .addresses()
            .into_iter()
            .map(Value::Address)
            .collect();
        assert_eq!(addresses.to_abi_array(), Value::Array(expected));
    }
}
