pub mod blockchain;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod sync;
pub mod tx;
pub mod view;

pub use blockchain::{Block, Chain, PreviousHash};
pub use client::{HttpLedgerClient, LedgerClient};
pub use endpoint::{Endpoint, EndpointContext, EndpointResolver};
pub use error::{LedgerError, SubmitError, ValidationError};
pub use sync::{RefreshOutcome, SyncHandle, SyncLoop, TransactionForm};
pub use tx::{Transaction, TransactionResult};
pub use view::TransactionView;
