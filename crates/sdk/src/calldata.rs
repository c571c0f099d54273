use bytes::Bytes;
use ethereum_types::{Address, U256};
use keccak_hash::keccak;

#[derive(Debug, thiserror::Error)]
pub enum CalldataEncodeError {
    #[error("Failed to parse function signature: {0}")]
    ParseError(String),
    #[error("Wrong number of arguments provided for calldata: {0}")]
    WrongArgumentLength(String),
    #[error("Fixed bytes value is {0} bytes long, at most 32 are allowed")]
    FixedBytesTooLong(usize),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Address(Address),
    Uint(U256),
    Int(U256),
    Bool(bool),
    Bytes(Bytes),
    String(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    FixedArray(Vec<Value>),
    FixedBytes(Bytes),
}

/// Splits `name(type,...)` into its name and top level parameter types.
/// Tuple parameters such as `(uint256,address)` are kept whole.
pub fn parse_signature(signature: &str) -> Result<(String, Vec<String>), CalldataEncodeError> {
    let sig = signature.trim().trim_start_matches("function ");
    let (name, params) = sig
        .split_once('(')
        .ok_or_else(|| CalldataEncodeError::ParseError(signature.to_owned()))?;
    let params = params
        .strip_suffix(')')
        .ok_or_else(|| CalldataEncodeError::ParseError(signature.to_owned()))?;

    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in params.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| CalldataEncodeError::ParseError(signature.to_owned()))?;
                current.push(c);
            }
            ',' if depth == 0 => {
                result.push(normalize_param(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(CalldataEncodeError::ParseError(signature.to_owned()));
    }
    if !current.trim().is_empty() || !result.is_empty() {
        result.push(normalize_param(&current));
    }
    if result.iter().any(String::is_empty) {
        return Err(CalldataEncodeError::ParseError(signature.to_owned()));
    }

    Ok((name.trim().to_string(), result))
}

// Drops parameter names, `uint256 amount` -> `uint256`.
fn normalize_param(param: &str) -> String {
    let param = param.trim();
    param
        .split_once(' ')
        .map(|(ty, _)| ty)
        .unwrap_or(param)
        .to_string()
}

pub fn compute_function_selector(name: &str, params: &[String]) -> [u8; 4] {
    let normalized_signature = format!("{name}({})", params.join(","));
    let hash = keccak(normalized_signature.as_bytes());

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

pub fn encode_calldata(signature: &str, values: &[Value]) -> Result<Vec<u8>, CalldataEncodeError> {
    let (name, params) = parse_signature(signature)?;

    if params.len() != values.len() {
        return Err(CalldataEncodeError::WrongArgumentLength(format!(
            "{signature} expects {} arguments, {} given",
            params.len(),
            values.len()
        )));
    }

    let function_selector = compute_function_selector(&name, &params);
    let mut with_selector = function_selector.to_vec();
    with_selector.extend_from_slice(&encode_arguments(values)?);

    Ok(with_selector)
}

/// ABI-encodes `values` as a tuple without selector, which is the layout
/// constructor arguments take after the creation bytecode.
pub fn encode_arguments(values: &[Value]) -> Result<Vec<u8>, CalldataEncodeError> {
    encode_tuple(values)
}

// Heads first (static values inline, offsets for dynamic ones), tails after.
fn encode_tuple(values: &[Value]) -> Result<Vec<u8>, CalldataEncodeError> {
    let head_len: usize = values.iter().map(static_offset_value).sum();

    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        if is_dynamic(value) {
            head.extend_from_slice(&u256_word(U256::from(head_len + tail.len())));
            tail.extend_from_slice(&encode_value(value)?);
        } else {
            head.extend_from_slice(&encode_value(value)?);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

fn encode_value(value: &Value) -> Result<Vec<u8>, CalldataEncodeError> {
    let encoded = match value {
        Value::Address(address) => address_to_word(*address).to_vec(),
        Value::Uint(number) | Value::Int(number) => u256_word(*number).to_vec(),
        Value::Bool(boolean) => u256_word(U256::from(u8::from(*boolean))).to_vec(),
        Value::FixedBytes(bytes) => {
            if bytes.len() > 32 {
                return Err(CalldataEncodeError::FixedBytesTooLong(bytes.len()));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(bytes);
            word.to_vec()
        }
        Value::Bytes(bytes) => encode_bytes(bytes),
        Value::String(string_value) => encode_bytes(string_value.as_bytes()),
        Value::Array(array_values) => {
            let mut ret = u256_word(U256::from(array_values.len())).to_vec();
            ret.extend_from_slice(&encode_tuple(array_values)?);
            ret
        }
        Value::Tuple(values) | Value::FixedArray(values) => encode_tuple(values)?,
    };
    Ok(encoded)
}

fn static_offset_value(value: &Value) -> usize {
    match value {
        Value::Tuple(values) | Value::FixedArray(values) if !is_dynamic(value) => {
            values.iter().map(static_offset_value).sum()
        }
        _ => 32,
    }
}

fn is_dynamic(value: &Value) -> bool {
    match value {
        Value::Bytes(_) | Value::String(_) | Value::Array(_) => true,
        Value::Tuple(values) | Value::FixedArray(values) => values.iter().any(is_dynamic),
        _ => false,
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut ret = u256_word(U256::from(bytes.len())).to_vec();
    ret.extend_from_slice(bytes);
    let padding = (32 - bytes.len() % 32) % 32;
    ret.resize(ret.len() + padding, 0);
    ret
}

fn u256_word(number: U256) -> [u8; 32] {
    number.to_big_endian()
}

fn address_to_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn word(n: u64) -> [u8; 32] {
        u256_word(U256::from(n))
    }

    #[test]
    fn calldata_test() {
        let raw_function_signature = "blockWithdrawalsLogs(uint256,bytes)";
        let mut bytes_calldata = vec![];
        bytes_calldata.extend_from_slice(&u256_word(U256::zero()));
        bytes_calldata.extend_from_slice(&u256_word(U256::one()));

        let arguments = vec![
            Value::Uint(U256::from(902)),
            Value::Bytes(bytes_calldata.into()),
        ];

        let calldata = encode_calldata(raw_function_signature, &arguments).unwrap();

        assert_eq!(
            calldata,
            vec![
                20, 108, 34, 199, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0, 3, 134, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 64, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 64, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
            ]
        );
    }

    #[test]
    fn erc20_transfer_selector() {
        let to = Address::from_low_u64_be(0xbeef);
        let calldata = encode_calldata(
            "transfer(address to, uint256 amount)",
            &[Value::Address(to), Value::Uint(U256::from(1))],
        )
        .unwrap();

        assert_eq!(&calldata[..4], &hex!("a9059cbb"));
        assert_eq!(&calldata[4..36], &address_to_word(to));
        assert_eq!(&calldata[36..], &word(1));
    }

    #[test]
    fn dynamic_array_goes_to_tail() {
        let collection = Address::from_low_u64_be(0x91);
        let calldata = encode_calldata(
            "stake721(address,uint256[])",
            &[
                Value::Address(collection),
                Value::Array(vec![Value::Uint(U256::zero()); 2]),
            ],
        )
        .unwrap();

        let expected_selector = compute_function_selector(
            "stake721",
            &["address".to_string(), "uint256[]".to_string()],
        );
        assert_eq!(&calldata[..4], &expected_selector);

        let body = &calldata[4..];
        assert_eq!(body.len(), 5 * 32);
        assert_eq!(&body[..32], &address_to_word(collection));
        assert_eq!(&body[32..64], &word(0x40));
        assert_eq!(&body[64..96], &word(2));
        assert_eq!(&body[96..], &[0u8; 64]);
    }

    #[test]
    fn constructor_with_two_arrays() {
        let payees = vec![
            Value::Address(Address::from_low_u64_be(0xa)),
            Value::Address(Address::from_low_u64_be(0xb)),
        ];
        let shares = vec![Value::Uint(U256::one()); 2];

        let encoded = encode_arguments(&[Value::Array(payees), Value::Array(shares)]).unwrap();

        assert_eq!(encoded.len(), 8 * 32);
        assert_eq!(&encoded[..32], &word(0x40));
        assert_eq!(&encoded[32..64], &word(0xa0));
        assert_eq!(&encoded[64..96], &word(2));
        assert_eq!(&encoded[96..128], &word(0xa));
        assert_eq!(&encoded[128..160], &word(0xb));
        assert_eq!(&encoded[160..192], &word(2));
        assert_eq!(&encoded[192..224], &word(1));
        assert_eq!(&encoded[224..], &word(1));
    }

    #[test]
    fn bytes_are_right_padded() {
        let encoded = encode_arguments(&[Value::Bytes(Bytes::from_static(&[1, 2]))]).unwrap();

        assert_eq!(encoded.len(), 3 * 32);
        assert_eq!(&encoded[..32], &word(0x20));
        assert_eq!(&encoded[32..64], &word(2));
        assert_eq!(&encoded[64..66], &[1, 2]);
        assert_eq!(&encoded[66..], &[0u8; 30]);
    }

    #[test]
    fn static_tuple_is_inlined() {
        let encoded = encode_arguments(&[
            Value::Tuple(vec![Value::Uint(U256::from(7)), Value::Bool(true)]),
            Value::Uint(U256::from(9)),
        ])
        .unwrap();

        assert_eq!(encoded, [word(7), word(1), word(9)].concat());
    }

    #[test]
    fn no_argument_function() {
        let calldata = encode_calldata("write()", &[]).unwrap();
        assert_eq!(calldata.len(), 4);
        assert_eq!(calldata, compute_function_selector("write", &[]).to_vec());
    }

    #[test]
    fn parse_signature_keeps_tuples_whole() {
        let (name, params) = parse_signature("settle((uint256,address),bool)").unwrap();
        assert_eq!(name, "settle");
        assert_eq!(params, vec!["(uint256,address)".to_string(), "bool".to_string()]);
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        assert!(parse_signature("transfer").is_err());
        assert!(parse_signature("transfer(address,").is_err());
        assert!(parse_signature("transfer(address,,uint256)").is_err());
    }

    #[test]
    fn argument_count_must_match() {
        let err = encode_calldata("transfer(address,uint256)", &[Value::Bool(true)]).unwrap_err();
        assert!(matches!(err, CalldataEncodeError::WrongArgumentLength(_)));
    }

    #[test]
    fn oversized_fixed_bytes_are_rejected() {
        let err = encode_arguments(&[Value::FixedBytes(Bytes::from(vec![0u8; 33]))]).unwrap_err();
        assert!(matches!(err, CalldataEncodeError::FixedBytesTooLong(33)));
    }
}
