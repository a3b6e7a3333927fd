//! Trade authorization
//!
//! Every buy and sell carries a `(nonce, signature)` pair issued by an
//! off-engine authority. The signed payload is rebuilt from the caller and
//! nonce, so a signature cannot be moved to another caller, and the nonce
//! must increase strictly per caller, so it cannot be replayed.

use std::collections::HashMap;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use lib_types::{Address, Nonce};
use serde::{Deserialize, Serialize};

use crate::errors::{AuthorizationError, LaunchResult};

const AUTH_DOMAIN: &[u8] = b"LAUNCHPAD_AUTH_V1";

/// Payload the authority signs for `(caller, nonce)`
pub fn authorization_message(caller: &Address, nonce: Nonce) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(AUTH_DOMAIN);
    hasher.update(caller.as_bytes());
    hasher.update(&nonce.to_le_bytes());
    *hasher.finalize().as_bytes()
}

/// 64-byte signature wrapper for serde compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature64(pub [u8; 64]);

impl Signature64 {
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl Serialize for Signature64 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Signature64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes: Vec<u8> = if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            hex::decode(&text).map_err(serde::de::Error::custom)?
        } else {
            Deserialize::deserialize(deserializer)?
        };
        let arr: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            serde::de::Error::custom(format!("Expected 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Signature64(arr))
    }
}

/// Nonce and authority signature attached to a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub nonce: Nonce,
    pub signature: Signature64,
}

/// Checks an authority signature over [`authorization_message`]
pub trait SignatureVerifier {
    fn verify(&self, caller: &Address, nonce: Nonce, signature: &Signature64) -> bool;
}

/// Ed25519 authority key
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    authority: VerifyingKey,
}

impl Ed25519Verifier {
    pub fn new(authority: VerifyingKey) -> Self {
        Self { authority }
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, AuthorizationError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self::new)
            .map_err(|e| AuthorizationError::InvalidAuthorityKey(e.to_string()))
    }

    /// Parse a hex key, with or without `0x`
    pub fn from_hex(key: &str) -> Result<Self, AuthorizationError> {
        let bytes = hex::decode(key.trim_start_matches("0x"))
            .map_err(|e| AuthorizationError::InvalidAuthorityKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            AuthorizationError::InvalidAuthorityKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn authority(&self) -> &VerifyingKey {
        &self.authority
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, caller: &Address, nonce: Nonce, signature: &Signature64) -> bool {
        let message = authorization_message(caller, nonce);
        let signature = Signature::from_bytes(signature.as_bytes());
        self.authority.verify(&message, &signature).is_ok()
    }
}

/// Authority-side helper producing the signature a trader submits
pub fn sign_authorization(key: &SigningKey, caller: &Address, nonce: Nonce) -> Authorization {
    let message = authorization_message(caller, nonce);
    Authorization {
        nonce,
        signature: Signature64(key.sign(&message).to_bytes()),
    }
}

/// Last consumed nonce per caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayGuard {
    last_nonce: HashMap<Address, Nonce>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_nonce(&self, caller: &Address) -> Option<Nonce> {
        self.last_nonce.get(caller).copied()
    }

    /// Verify the signature, then consume the nonce
    pub fn authorize(
        &mut self,
        verifier: &dyn SignatureVerifier,
        caller: &Address,
        auth: &Authorization,
    ) -> LaunchResult<()> {
        if !verifier.verify(caller, auth.nonce, &auth.signature) {
            return Err(AuthorizationError::InvalidSignature { caller: *caller }.into());
        }
        if let Some(last) = self.last_nonce(caller) {
            if auth.nonce <= last {
                return Err(AuthorizationError::StaleNonce {
                    caller: *caller,
                    nonce: auth.nonce,
                    last,
                }
                .into());
            }
        }
        self.last_nonce.insert(*caller, auth.nonce);
        Ok(())
    }
}
