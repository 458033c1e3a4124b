use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("invalid private key encoding")]
    InvalidPrivateKey,
    #[error("invalid public key encoding")]
    InvalidPublicKey,
    #[error("invalid signature encoding")]
    InvalidSignature,
}

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex, address_hex).
/// The address is simply the hex of the compressed public key.
pub fn generate_keypair_hex() -> (String, String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    let sk_hex = hex::encode(sk.secret_bytes());
    let pk_hex = hex::encode(pk.serialize()); // compressed (33 bytes)
    let address = pk_hex.clone();
    (sk_hex, pk_hex, address)
}

/// Derive the address (hex of the compressed pubkey) from a hex pubkey.
/// Returns normalized lowercase hex if valid.
pub fn pubkey_to_address_hex(pubkey_hex: &str) -> Result<String, WalletError> {
    let bytes = hex::decode(pubkey_hex).map_err(|_| WalletError::InvalidPublicKey)?;
    let pk = PublicKey::from_slice(&bytes).map_err(|_| WalletError::InvalidPublicKey)?;
    Ok(hex::encode(pk.serialize()))
}

/// SHA-256 of arbitrary message bytes; ECDSA here always signs this digest.
pub fn message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(message);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Sign a message with a hex private key; returns the DER signature as hex.
pub fn sign_message_hex(privkey_hex: &str, message: &[u8]) -> Result<String, WalletError> {
    let secp = Secp256k1::signing_only();
    let sk_bytes = hex::decode(privkey_hex).map_err(|_| WalletError::InvalidPrivateKey)?;
    let sk = SecretKey::from_slice(&sk_bytes).map_err(|_| WalletError::InvalidPrivateKey)?;
    let msg = Message::from_digest(message_digest(message));
    let sig = secp.sign_ecdsa(&msg, &sk);
    Ok(hex::encode(sig.serialize_der()))
}

/// Verify a hex DER signature against a hex compressed pubkey and message bytes.
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    message: &[u8],
) -> Result<bool, WalletError> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| WalletError::InvalidSignature)?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| WalletError::InvalidSignature)?;

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| WalletError::InvalidPublicKey)?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| WalletError::InvalidPublicKey)?;

    let msg = Message::from_digest(message_digest(message));
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}
