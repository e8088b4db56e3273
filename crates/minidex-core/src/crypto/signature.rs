use ed25519_dalek::{Signature as DalekSignature, Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_big_array::BigArray;
use std::fmt;

use crate::crypto::keys::{PublicKey, SecretKey};
use crate::error::CoreError;

const SIG_LEN: usize = 64;

/// Ed25519 signature.
///
/// Hex text in JSON so signed transactions can be posted by hand; raw bytes
/// in bincode, which is what the signing hash covers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Sig(pub [u8; SIG_LEN]);

impl Sig {
    /// Whether no signature has been attached yet
    pub fn is_unsigned(&self) -> bool {
        self.0 == [0u8; SIG_LEN]
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        let arr: [u8; SIG_LEN] = bytes.try_into().map_err(|_| CoreError::InvalidSignature)?;
        Ok(Sig(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Sig {
    fn default() -> Self {
        Sig([0u8; SIG_LEN])
    }
}

impl fmt::Debug for Sig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for Sig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            BigArray::serialize(&self.0, serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Sig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Sig::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes: [u8; SIG_LEN] = BigArray::deserialize(deserializer)?;
            Ok(Sig(bytes))
        }
    }
}

/// Sign a message with a secret key
pub fn sign(secret_key: &SecretKey, message: &[u8]) -> Sig {
    Sig(secret_key.signing_key().sign(message).to_bytes())
}

/// Check `signature` over `message` against `public_key`
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Sig) -> Result<(), CoreError> {
    if signature.is_unsigned() {
        return Err(CoreError::InvalidSignature);
    }
    public_key
        .to_verifying_key()?
        .verify(message, &DalekSignature::from_bytes(&signature.0))
        .map_err(|_| CoreError::InvalidSignature)
}
