use serde::{Deserialize, Serialize};

use crate::blockchain::PreviousHash;

/// Sender used by the ledger for mining reward transactions.
pub const REWARD_SENDER: &str = "0";

/// Represents a transaction recorded on the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The sending account name.
    pub sender: String,
    /// The receiving account name.
    pub recipient: String,
    /// The amount to transfer. Always positive for user transactions.
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Returns true for transactions minted by the ledger itself.
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

/// Body returned by the ledger when a transaction is accepted.
///
/// Only `message` is guaranteed; nodes that report the pending block
/// fill in the rest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionResult {
    pub message: String,
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub proof: Option<u64>,
    #[serde(default)]
    pub previous_hash: Option<PreviousHash>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_transactions_are_detected_by_sender() {
        assert!(Transaction::new("0", "Alan", 1.0).is_reward());
        assert!(!Transaction::new("Alan", "0", 1.0).is_reward());
        assert!(!Transaction::new("00", "Bob", 1.0).is_reward());
    }

    #[test]
    fn result_accepts_message_only_body() {
        let result: TransactionResult =
            serde_json::from_str(r#"{"message":"Transaction will be added to Block 3"}"#).unwrap();
        assert_eq!(result.message, "Transaction will be added to Block 3");
        assert_eq!(result.index, None);
        assert!(result.transactions.is_empty());
    }

    #[test]
    fn result_decodes_full_body() {
        let body = r#"{
            "message": "New Block Forged",
            "index": 2,
            "transactions": [{"sender":"Alan","recipient":"Bob","amount":5}],
            "proof": 35293,
            "previous_hash": "a1b2c3"
        }"#;
        let result: TransactionResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.index, Some(2));
        assert_eq!(result.proof, Some(35293));
        assert_eq!(result.transactions, vec![Transaction::new("Alan", "Bob", 5.0)]);
        assert_eq!(result.previous_hash, Some(PreviousHash::Text("a1b2c3".into())));
    }
}
