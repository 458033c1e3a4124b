use serde::{Deserialize, Serialize};

use crate::blockchain::REWARD_SENDER;

/// A signed value transfer. Field order is the canonical wire order used by
/// the block hash preimage; do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub fee: u64,
    /// Hex-encoded compressed secp256k1 public key of the signer.
    pub public_key: String,
    /// Hex-encoded DER ECDSA signature over `signing_message()`.
    pub signature: String,
}

impl Transaction {
    /// Canonical message bytes covered by the signature:
    /// sender, recipient, amount and fee concatenated with no separators.
    pub fn signing_message(&self) -> Vec<u8> {
        format!(
            "{}{}{}{}",
            self.sender, self.recipient, self.amount, self.fee
        )
        .into_bytes()
    }

    /// Synthesize the miner reward credited on block acceptance.
    /// Carries no signature; only the acceptance protocol creates these.
    pub fn reward(miner_address: &str, amount: u64) -> Self {
        Self {
            sender: REWARD_SENDER.to_string(),
            recipient: miner_address.to_string(),
            amount,
            fee: 0,
            public_key: String::new(),
            signature: String::new(),
        }
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER && self.signature.is_empty()
    }

    /// Structural presence check; amounts are non-negative by type.
    pub fn has_required_fields(&self) -> bool {
        !self.sender.is_empty()
            && !self.recipient.is_empty()
            && !self.public_key.is_empty()
            && !self.signature.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Transaction;

    #[test]
    fn signing_message_concatenates_in_order() {
        let tx = Transaction {
            sender: "alice".into(),
            recipient: "bob".into(),
            amount: 10,
            fee: 1,
            public_key: "pk".into(),
            signature: "sig".into(),
        };
        assert_eq!(tx.signing_message(), b"alicebob101".to_vec());
    }

    #[test]
    fn reward_is_exempt_and_unsigned() {
        let reward = Transaction::reward("miner-addr", 51);
        assert!(reward.is_reward());
        assert_eq!(reward.sender, "BLOCKCHAIN");
        assert_eq!(reward.recipient, "miner-addr");
        assert_eq!(reward.amount, 51);
        assert_eq!(reward.fee, 0);
        assert!(!reward.has_required_fields());
    }

    #[test]
    fn wire_order_matches_hash_preimage_contract() {
        let tx = Transaction {
            sender: "a".into(),
            recipient: "b".into(),
            amount: 1,
            fee: 0,
            public_key: "pk".into(),
            signature: "sig".into(),
        };
        let json = serde_json::to_string(&tx).expect("serialize tx");
        assert_eq!(
            json,
            r#"{"sender":"a","recipient":"b","amount":1,"fee":0,"public_key":"pk","signature":"sig"}"#
        );
    }
}
