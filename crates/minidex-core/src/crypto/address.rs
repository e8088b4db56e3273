use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::hash::hash_parts;
use crate::crypto::keys::PublicKey;
use crate::error::CoreError;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// A 20-byte account or contract address, rendered as `0x`-prefixed hex.
///
/// Accounts derive their address from their Ed25519 public key; contracts
/// derive it from the deployer address and the deployer's nonce at the time
/// of deployment, so redeploying the same sequence yields the same addresses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Address of an externally owned account
    pub fn from_public_key(pubkey: &PublicKey) -> Self {
        let digest = hash_parts(&[b"account", pubkey.as_bytes()]);
        Self::truncate(digest.as_bytes())
    }

    /// Address of a contract created by `deployer` with transaction `nonce`
    pub fn contract(deployer: &Address, nonce: u64) -> Self {
        let digest = hash_parts(&[b"contract", deployer.as_bytes(), &nonce.to_le_bytes()]);
        Self::truncate(digest.as_bytes())
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let arr: [u8; ADDRESS_LEN] = slice.try_into().ok()?;
        Some(Address(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))?;
        Self::from_slice(&bytes).ok_or_else(|| CoreError::InvalidAddress(s.to_string()))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    fn truncate(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Address(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

// Addresses are hex strings in every encoding so the deployment record and
// RPC payloads stay readable.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_account_address_deterministic() {
        let kp = KeyPair::generate();
        assert_eq!(
            Address::from_public_key(&kp.public),
            Address::from_public_key(&kp.public)
        );
    }

    #[test]
    fn test_contract_address_depends_on_nonce() {
        let deployer = Address::from_public_key(&KeyPair::generate().public);
        let first = Address::contract(&deployer, 0);
        assert_ne!(first, Address::contract(&deployer, 1));
        assert_eq!(first, Address::contract(&deployer, 0));
    }

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::contract(&Address::ZERO, 7);
        let text = addr.to_hex();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + ADDRESS_LEN * 2);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(matches!(
            Address::from_hex("0xabcd"),
            Err(CoreError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_json_is_hex_string() {
        let addr = Address::contract(&Address::ZERO, 1);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
    }
}
