//! secp256k1 signature recovery for Ethereum `personal_sign` messages.

use crate::error::AuthError;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use sha3::{Digest, Keccak256};

/// Length of an `r || s || v` signature in bytes.
const SIGNATURE_LEN: usize = 65;

/// Recovers the address that produced a signature over a message.
pub trait SignatureVerifier: Send + Sync {
    /// Returns the signer's address, or `AuthError::InvalidSignature` if the
    /// signature cannot be parsed or recovered.
    fn recover(&self, message: &str, signature: &str) -> Result<String, AuthError>;
}

/// Ethereum ecrecover over the EIP-191 `personal_sign` digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcRecover;

impl SignatureVerifier for EcRecover {
    fn recover(&self, message: &str, signature: &str) -> Result<String, AuthError> {
        let bytes = hex::decode(strip_hex_prefix(signature))
            .map_err(|e| AuthError::InvalidSignature(format!("not hex: {}", e)))?;

        if bytes.len() != SIGNATURE_LEN {
            return Err(AuthError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }

        // Wallets emit v as 27/28; raw signers emit 0/1
        let v = match bytes[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            other => {
                return Err(AuthError::InvalidSignature(format!(
                    "unsupported recovery id {}",
                    other
                )))
            }
        };

        let recovery_id = RecoveryId::from_i32(i32::from(v))
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

        let digest = Message::from_digest(personal_message_hash(message.as_bytes()));
        let pubkey = SECP256K1
            .recover_ecdsa(&digest, &signature)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

        Ok(address_of(&pubkey))
    }
}

/// Structural check run before any store lookup: exactly 65 bytes of hex
/// with an optional `0x` prefix. Curve validity is left to recovery.
pub fn is_well_formed_signature(signature: &str) -> bool {
    let digits = strip_hex_prefix(signature);
    digits.len() == SIGNATURE_LEN * 2 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// EIP-191 digest: `keccak256("\x19Ethereum Signed Message:\n" + len + message)`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// EIP-55 checksummed address of a public key.
pub fn address_of(pubkey: &PublicKey) -> String {
    let uncompressed = pubkey.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    to_checksum_address(&hash[12..])
}

/// Render 20 address bytes with EIP-55 mixed-case checksum.
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Produce a `0x`-prefixed `personal_sign` signature with `v` in {27, 28}.
pub fn sign_personal_message(secret: &SecretKey, message: &str) -> String {
    let digest = Message::from_digest(personal_message_hash(message.as_bytes()));
    let (recovery_id, compact) = SECP256K1
        .sign_ecdsa_recoverable(&digest, secret)
        .serialize_compact();

    let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
    bytes.extend_from_slice(&compact);
    bytes.push(27 + recovery_id.to_i32() as u8);
    format!("0x{}", hex::encode(bytes))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_test_secret_key() -> SecretKey {
        let mut seed = [0u8; 32];
        rand::fill(&mut seed);
        SecretKey::from_slice(&seed).unwrap()
    }

    #[test]
    fn test_recover_valid_signature() {
        let secret = generate_test_secret_key();
        let expected = address_of(&PublicKey::from_secret_key_global(&secret));

        let signature = sign_personal_message(&secret, "Sign in to IDHub: 42");
        let recovered = EcRecover.recover("Sign in to IDHub: 42", &signature).unwrap();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn test_recover_wrong_message_yields_other_address() {
        let secret = generate_test_secret_key();
        let expected = address_of(&PublicKey::from_secret_key_global(&secret));

        let signature = sign_personal_message(&secret, "original");
        let recovered = EcRecover.recover("tampered", &signature).unwrap();
        assert_ne!(recovered, expected);
    }

    #[test]
    fn test_recover_accepts_raw_recovery_id() {
        let secret = generate_test_secret_key();
        let signature = sign_personal_message(&secret, "hello");

        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] -= 27;
        let raw = hex::encode(bytes);

        assert_eq!(
            EcRecover.recover("hello", &raw).unwrap(),
            EcRecover.recover("hello", &signature).unwrap()
        );
    }

    #[test]
    fn test_recover_rejects_bad_length() {
        let result = EcRecover.recover("hello", "0xdeadbeef");
        assert!(matches!(result, Err(AuthError::InvalidSignature(_))));
    }

    #[test]
    fn test_recover_rejects_non_hex() {
        let result = EcRecover.recover("hello", "0xnothex");
        assert!(matches!(result, Err(AuthError::InvalidSignature(_))));
    }

    #[test]
    fn test_recover_rejects_bad_recovery_id() {
        let secret = generate_test_secret_key();
        let signature = sign_personal_message(&secret, "hello");
        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] = 5;

        let result = EcRecover.recover("hello", &hex::encode(bytes));
        assert!(matches!(result, Err(AuthError::InvalidSignature(_))));
    }

    #[test]
    fn test_well_formed_signature() {
        let secret = generate_test_secret_key();
        let signature = sign_personal_message(&secret, "hello");
        assert!(is_well_formed_signature(&signature));
        assert!(is_well_formed_signature(&signature[2..]));
        assert!(is_well_formed_signature(&signature.to_uppercase()[2..]));
        assert!(is_well_formed_signature(&"ab".repeat(SIGNATURE_LEN)));

        assert!(!is_well_formed_signature(""));
        assert!(!is_well_formed_signature("0x"));
        assert!(!is_well_formed_signature("0xzz"));
        // Odd length is not decodable
        assert!(!is_well_formed_signature("0xabc"));
        // Decodable, wrong length
        assert!(!is_well_formed_signature("0xdeadbeef"));
        assert!(!is_well_formed_signature(&"ab".repeat(SIGNATURE_LEN + 1)));
        // Right length, one non-hex digit
        let mut bad = "ab".repeat(SIGNATURE_LEN);
        bad.replace_range(0..1, "g");
        assert!(!is_well_formed_signature(&bad));
    }

    #[test]
    fn test_checksum_address_eip55_vectors() {
        // Test vectors from EIP-55
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let bytes = hex::decode(&expected[2..].to_lowercase()).unwrap();
            assert_eq!(to_checksum_address(&bytes), expected);
        }
    }
}
