use std::fmt;

use chrono::{DateTime, Local, Utc};

use crate::blockchain::Chain;
use crate::tx::Transaction;

/// What the dashboard shows for one chain snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionView {
    /// User transactions across all blocks, rewards removed.
    pub transactions: Vec<Transaction>,
    pub block_count: usize,
    /// Creation time of the newest block, if the chain has one.
    pub latest_block_at: Option<DateTime<Utc>>,
    /// Wall-clock time the view was built, not taken from the chain.
    pub last_updated: DateTime<Local>,
}

impl TransactionView {
    pub fn project(chain: &Chain) -> Self {
        let transactions = chain
            .transactions()
            .filter(|tx| !tx.is_reward())
            .cloned()
            .collect();
        Self {
            transactions,
            block_count: chain.len(),
            latest_block_at: chain.blocks().last().and_then(|block| block.created_at()),
            last_updated: Local::now(),
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

impl fmt::Display for TransactionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transactions ({})", self.transaction_count())?;
        if self.transactions.is_empty() {
            writeln!(f, "  No transactions yet. Create one to get started!")?;
        }
        for tx in &self.transactions {
            writeln!(f, "  {} → {}  {}", tx.sender, tx.recipient, tx.amount)?;
        }
        writeln!(f, "Total Blocks: {}", self.block_count)?;
        if let Some(at) = self.latest_block_at {
            writeln!(f, "Latest Block: {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"))?;
        }
        write!(f, "Last Update: {}", self.last_updated.format("%H:%M:%S"))
    }
}
