use ethereum_types::Address;
use keccak_hash::keccak;
use rand::Rng;
use secp256k1::{PublicKey, SECP256K1, SecretKey};

/// Last 20 bytes of the keccak hash of the uncompressed public key.
pub fn address_from_pub_key(public_key: &PublicKey) -> Address {
    let bytes = public_key.serialize_uncompressed();
    let hash = keccak(&bytes[1..]);
    Address::from_slice(&hash.as_bytes()[12..])
}

pub fn address_from_secret_key(secret_key: &SecretKey) -> Address {
    address_from_pub_key(&PublicKey::from_secret_key(SECP256K1, secret_key))
}

/// Address of a freshly generated key pair, as a wallet would create it.
pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> Address {
    address_from_secret_key(&SecretKey::new(rng))
}
