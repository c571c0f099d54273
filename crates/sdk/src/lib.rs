pub mod artifact;
pub mod calldata;
pub mod keys;

pub use artifact::{ArtifactError, ContractArtifact};
pub use calldata::{CalldataEncodeError, Value, encode_arguments, encode_calldata};
