use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::tx::Transaction;

/// Link to the parent block. Genesis blocks carry a plain integer,
/// later blocks a hex digest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PreviousHash {
    Integer(i64),
    Text(String),
}

impl fmt::Display for PreviousHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousHash::Integer(n) => write!(f, "{n}"),
            PreviousHash::Text(s) => f.write_str(s),
        }
    }
}

/// Represents a block in the blockchain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Block {
    /// Position of the block in the chain, starting at 0.
    pub index: u64,
    /// Creation time in seconds since the epoch.
    pub timestamp: f64,
    /// The transactions included in the block, in ledger order.
    pub transactions: Vec<Transaction>,
    /// Proof-of-work answer found by the miner.
    pub proof: u64,
    /// Hash of the parent block.
    pub previous_hash: PreviousHash,
}

impl Block {
    /// Block timestamp as a UTC datetime, if it is representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if !self.timestamp.is_finite() {
            return None;
        }
        let secs = self.timestamp.trunc() as i64;
        let nanos = (self.timestamp.fract() * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

/// A full snapshot of the chain as served by `GET /chain`.
///
/// Snapshots are replaced wholesale on every successful poll and never
/// merged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Chain {
    /// Blocks in ascending index order.
    pub chain: Vec<Block>,
    /// Number of blocks as reported by the node.
    pub length: usize,
}

impl Chain {
    pub fn new(blocks: Vec<Block>) -> Self {
        let length = blocks.len();
        Self {
            chain: blocks,
            length,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Number of blocks actually present in the snapshot.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Every transaction in block order, rewards included.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.chain.iter().flat_map(|block| block.transactions.iter())
    }
}
