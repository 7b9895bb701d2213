use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::blockchain::Chain;
use crate::client::LedgerClient;
use crate::error::{SubmitError, ValidationError};
use crate::tx::{Transaction, TransactionResult};
use crate::view::TransactionView;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shown instead of the underlying error when a refresh fails.
pub const FETCH_FAILED: &str = "Failed to fetch blockchain data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Sender,
    Recipient,
    Amount,
}

/// Raw, unvalidated user input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionForm {
    pub sender: String,
    pub recipient: String,
    pub amount: String,
}

impl TransactionForm {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Sender => &mut self.sender,
            FormField::Recipient => &mut self.recipient,
            FormField::Amount => &mut self.amount,
        };
        *slot = value.into();
    }

    /// Turns the form into a transaction. The amount must be a finite
    /// number greater than zero.
    pub fn validate(&self) -> Result<Transaction, ValidationError> {
        let sender = self.sender.trim();
        let recipient = self.recipient.trim();
        let amount = self.amount.trim();
        if sender.is_empty() || recipient.is_empty() || amount.is_empty() {
            return Err(ValidationError::MissingField);
        }

        let amount = amount
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite() && *a > 0.0)
            .ok_or(ValidationError::InvalidAmount)?;

        Ok(Transaction::new(sender, recipient, amount))
    }
}

/// Everything the sync loop owns.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub chain: Chain,
    pub last_error: Option<String>,
    pub form: TransactionForm,
    /// A submission is in flight.
    pub submitting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched chain replaced the snapshot.
    Applied,
    /// The fetch failed; the snapshot was kept.
    Failed,
    /// A newer refresh already completed while this one was in flight,
    /// so its result was dropped.
    Discarded,
}

/// Keeps an in-memory copy of the chain in step with the node.
///
/// Owns the snapshot, the last user-facing error and the form. Callers
/// read through accessors and mutate only through `set_field`, `submit`
/// and `refresh`.
pub struct SyncLoop {
    client: Arc<dyn LedgerClient>,
    state: Mutex<SyncState>,
    /// Sequence number of the most recently issued refresh.
    issued: AtomicU64,
    /// Highest sequence number whose result was applied or failed.
    /// Only written with `state` locked.
    completed: AtomicU64,
}

impl SyncLoop {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            client,
            state: Mutex::new(SyncState::default()),
            issued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SyncState {
        self.state.lock().clone()
    }

    pub fn chain(&self) -> Chain {
        self.state.lock().chain.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub fn form(&self) -> TransactionForm {
        self.state.lock().form.clone()
    }

    pub fn view(&self) -> TransactionView {
        TransactionView::project(&self.state.lock().chain)
    }

    pub fn set_field(&self, field: FormField, value: impl Into<String>) {
        self.state.lock().form.set(field, value);
    }

    /// Fetches the chain and, unless a refresh issued later has already
    /// completed, replaces the snapshot with it. Refreshes that are dropped
    /// before completing never shadow older ones.
    ///
    /// On failure the previous snapshot stays in place and `last_error` is
    /// set to [`FETCH_FAILED`]; the cause is only logged.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.client.fetch_chain().await;

        let mut state = self.state.lock();
        if seq <= self.completed.load(Ordering::SeqCst) {
            debug!(seq, "discarding stale chain response");
            return RefreshOutcome::Discarded;
        }
        self.completed.store(seq, Ordering::SeqCst);
        match result {
            Ok(chain) => {
                trace!(seq, blocks = chain.len(), "chain snapshot replaced");
                state.chain = chain;
                state.last_error = None;
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(seq, error = ?e, "chain refresh failed");
                state.last_error = Some(FETCH_FAILED.to_string());
                RefreshOutcome::Failed
            }
        }
    }

    /// Validates the form and submits it once.
    ///
    /// Invalid input never reaches the node. On success the form is
    /// cleared and the chain refreshed right away; on failure the form is
    /// left as typed so the user can try again. Nothing is retried.
    pub async fn submit(&self) -> Result<TransactionResult, SubmitError> {
        let tx = {
            let mut state = self.state.lock();
            match state.form.validate() {
                Ok(tx) => {
                    state.last_error = None;
                    state.submitting = true;
                    tx
                }
                Err(e) => {
                    state.last_error = Some(e.to_string());
                    return Err(e.into());
                }
            }
        };

        let result = self.client.submit_transaction(&tx).await;

        match result {
            Ok(accepted) => {
                info!(sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "transaction accepted");
                {
                    let mut state = self.state.lock();
                    state.form = TransactionForm::default();
                }
                self.refresh().await;
                self.state.lock().submitting = false;
                Ok(accepted)
            }
            Err(e) => {
                let mut state = self.state.lock();
                state.last_error = Some(e.to_string());
                state.submitting = false;
                Err(e.into())
            }
        }
    }

    /// Starts the periodic refresh: once immediately, then every `period`.
    ///
    /// The task stops when [`SyncHandle::stop`] is called or the handle is
    /// dropped. A scheduled refresh still in flight at that point is
    /// dropped with it.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> SyncHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let sync = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    outcome = sync.refresh() => trace!(?outcome, "scheduled refresh"),
                }
            }
            debug!("sync loop stopped");
        });

        SyncHandle { shutdown, task }
    }
}

/// Owner of a running periodic refresh task.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "sync loop task did not finish cleanly");
        }
    }
}
