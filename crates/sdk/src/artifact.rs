//! Compiled contract artifacts.
//!
//! Two layouts are understood:
//! - Hardhat: `<dir>/contracts/<Name>.sol/<Name>.json` (or `<dir>/<Name>.json`)
//!   holding `abi` and `bytecode`.
//! - solc `--bin --abi` output: `<dir>/<Name>.bin` next to `<dir>/<Name>.abi`.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calldata::{CalldataEncodeError, Value, encode_arguments};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("No artifact for {0} found in {1}")]
    NotFound(String, PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse artifact of {contract}: {source}")]
    Json {
        contract: String,
        source: serde_json::Error,
    },
    #[error("{0} has no deployable bytecode (abstract contract or interface?)")]
    EmptyBytecode(String),
    #[error("{0} bytecode is not valid hex (unlinked library?): {1}")]
    InvalidBytecode(String, hex::FromHexError),
    #[error("{contract} has no function named {function}")]
    UnknownFunction { contract: String, function: String },
    #[error("{contract} declares {count} overloads of {function}, pass the full signature")]
    AmbiguousFunction {
        contract: String,
        function: String,
        count: usize,
    },
    #[error("Failed to encode constructor arguments: {0}")]
    Calldata(#[from] CalldataEncodeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    /// Canonical type as used in selectors; tuples expand to their components.
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> = self
                    .components
                    .iter()
                    .map(AbiParam::canonical_type)
                    .collect();
                format!("({}){suffix}", inner.join(","))
            }
            None => self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub state_mutability: Option<String>,
}

impl AbiEntry {
    pub fn signature(&self) -> Option<String> {
        let name = self.name.as_ref()?;
        let inputs: Vec<String> = self.inputs.iter().map(AbiParam::canonical_type).collect();
        Some(format!("{name}({})", inputs.join(",")))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: Vec<AbiEntry>,
    bytecode: String,
}

#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: Vec<AbiEntry>,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Looks `name` up in `artifacts_dir`, trying the Hardhat layout first.
    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self, ArtifactError> {
        let hardhat_candidates = [
            artifacts_dir
                .join("contracts")
                .join(format!("{name}.sol"))
                .join(format!("{name}.json")),
            artifacts_dir.join(format!("{name}.json")),
        ];
        for path in hardhat_candidates {
            if path.is_file() {
                debug!(contract = name, path = %path.display(), "Loading hardhat artifact");
                let json = read(&path)?;
                return Self::from_hardhat_json(name, &json);
            }
        }

        let bin_path = artifacts_dir.join(format!("{name}.bin"));
        let abi_path = artifacts_dir.join(format!("{name}.abi"));
        if bin_path.is_file() && abi_path.is_file() {
            debug!(contract = name, path = %bin_path.display(), "Loading solc output");
            return Self::from_solc_output(name, &read(&bin_path)?, &read(&abi_path)?);
        }

        Err(ArtifactError::NotFound(
            name.to_string(),
            artifacts_dir.to_path_buf(),
        ))
    }

    pub fn from_hardhat_json(name: &str, json: &str) -> Result<Self, ArtifactError> {
        let artifact: HardhatArtifact =
            serde_json::from_str(json).map_err(|source| ArtifactError::Json {
                contract: name.to_string(),
                source,
            })?;
        let name = artifact.contract_name.unwrap_or_else(|| name.to_string());
        let bytecode = decode_bytecode(&name, &artifact.bytecode)?;
        Ok(Self {
            name,
            abi: artifact.abi,
            bytecode,
        })
    }

    pub fn from_solc_output(name: &str, bin: &str, abi: &str) -> Result<Self, ArtifactError> {
        let abi: Vec<AbiEntry> = serde_json::from_str(abi).map_err(|source| ArtifactError::Json {
            contract: name.to_string(),
            source,
        })?;
        let bytecode = decode_bytecode(name, bin)?;
        Ok(Self {
            name: name.to_string(),
            abi,
            bytecode,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiEntry> {
        self.abi.iter().filter(|entry| entry.kind == "function")
    }

    pub fn has_function(&self, function: &str) -> bool {
        self.functions()
            .any(|entry| entry.name.as_deref() == Some(function))
    }

    /// Canonical signature (`name(type,...)`) of the single function called
    /// `function`.
    pub fn function_signature(&self, function: &str) -> Result<String, ArtifactError> {
        let mut matches = self
            .functions()
            .filter(|entry| entry.name.as_deref() == Some(function))
            .filter_map(AbiEntry::signature);

        let signature = matches.next().ok_or_else(|| ArtifactError::UnknownFunction {
            contract: self.name.clone(),
            function: function.to_string(),
        })?;

        let others = matches.count();
        if others > 0 {
            return Err(ArtifactError::AmbiguousFunction {
                contract: self.name.clone(),
                function: function.to_string(),
                count: others + 1,
            });
        }

        Ok(signature)
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    pub fn init_code(&self, constructor_args: &[Value]) -> Result<Bytes, ArtifactError> {
        let mut init_code = self.bytecode.to_vec();
        init_code.extend_from_slice(&encode_arguments(constructor_args)?);
        Ok(Bytes::from(init_code))
    }
}

fn read(path: &Path) -> Result<String, ArtifactError> {
    std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_bytecode(name: &str, bytecode: &str) -> Result<Bytes, ArtifactError> {
    let trimmed = bytecode.trim().trim_start_matches("0x");
    if trimmed.is_empty() {
        return Err(ArtifactError::EmptyBytecode(name.to_string()));
    }
    hex::decode(trimmed)
        .map(Bytes::from)
        .map_err(|e| ArtifactError::InvalidBytecode(name.to_string(), e))
}
