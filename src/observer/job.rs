// File: src/observer/job.rs

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use super::config::ObserverConfig;
use super::processing::{ProcessingContext, ProcessingStatus, TransactionUnderProcessing};
use super::recovery::{self, RecoveryStores};
use crate::error::{ObserverError, ObserverResult};
use crate::traits::{
    ConfirmationStore, LedgerClient, OperationStore, ReadResult, Transaction, TransactionStore,
    UnresolvableTransactionStore, VersionManager,
};

/// Ledger observer
///
/// Each cycle reads new transactions after the cursor, admits them through the
/// throughput limiter of the active protocol version and resolves the
/// admitted ones concurrently. Transactions are committed to the transaction
/// store strictly in transaction number order, once their resolution and its
/// retry bookkeeping have completed.
///
/// An invalid read cursor is treated as a reorganization once the ledger has
/// caught up with the cursor's time; stored state is then rolled back to the
/// newest transaction the ledger still accepts.
pub struct Observer {
    ledger: Arc<dyn LedgerClient>,
    versions: Arc<dyn VersionManager>,
    operation_store: Arc<dyn OperationStore>,
    transaction_store: Arc<dyn TransactionStore>,
    unresolvable_store: Arc<dyn UnresolvableTransactionStore>,
    confirmation_store: Arc<dyn ConfirmationStore>,
    config: ObserverConfig,

    /// Dispatched transactions not yet committed, by transaction number
    window: VecDeque<TransactionUnderProcessing>,

    /// Last transaction read from the ledger
    cursor: Option<Transaction>,
}

impl Observer {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        versions: Arc<dyn VersionManager>,
        operation_store: Arc<dyn OperationStore>,
        transaction_store: Arc<dyn TransactionStore>,
        unresolvable_store: Arc<dyn UnresolvableTransactionStore>,
        confirmation_store: Arc<dyn ConfirmationStore>,
        config: ObserverConfig,
    ) -> Self {
        Self {
            ledger,
            versions,
            operation_store,
            transaction_store,
            unresolvable_store,
            confirmation_store,
            config,
            window: VecDeque::new(),
            cursor: None,
        }
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn cursor(&self) -> Option<&Transaction> {
        self.cursor.as_ref()
    }

    /// Transactions dispatched but not yet committed
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    /// Run observation cycles until a shutdown signal is received
    ///
    /// A failed cycle is logged and the next one runs on schedule. In-flight
    /// resolutions are awaited before returning.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.interval_secs,
            max_concurrent_downloads = self.config.max_concurrent_downloads,
            "Observer started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.process_once().await {
                        tracing::error!(error = %e, "Observer cycle failed");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Observer shutting down");
                    break;
                }
            }
        }

        if let Err(e) = self.settle().await {
            tracing::error!(error = %e, "Failed to commit processed transactions on shutdown");
        }
    }

    /// Run one observation cycle
    pub async fn process_once(&mut self) -> ObserverResult<()> {
        loop {
            self.flush_processed().await?;

            let read_from = match &self.cursor {
                Some(cursor) => Some(cursor.clone()),
                None => self.transaction_store.last_transaction().await?,
            };

            let (read, invalid_cursor) = self.read_after(read_from.as_ref()).await?;

            let qualified = self.select_qualified(&read.transactions).await?;
            for transaction in qualified {
                self.dispatch(transaction);
            }

            if invalid_cursor && self.is_reorganization(read_from.as_ref()).await? {
                tracing::info!(
                    transaction_number = ?read_from.as_ref().map(|t| t.transaction_number),
                    "Ledger reorganization detected"
                );

                self.settle().await?;
                recovery::revert_invalid_transactions(RecoveryStores {
                    ledger: &self.ledger,
                    operation_store: &self.operation_store,
                    transaction_store: &self.transaction_store,
                    unresolvable_store: &self.unresolvable_store,
                    confirmation_store: &self.confirmation_store,
                })
                .await?;
                self.cursor = None;
            } else {
                self.wait_for_capacity(self.config.max_concurrent_downloads).await;
                self.flush_processed().await?;

                if let Some(last) = read.transactions.last() {
                    self.cursor = Some(last.clone());
                }
            }

            // entries behind a blocked front may already have failed
            for entry in self.window.iter_mut() {
                entry.refresh().await;
            }
            if self.window.iter().any(|t| t.status == ProcessingStatus::Error) {
                self.abandon_window().await?;
                break;
            }

            if !read.more_transactions {
                break;
            }
        }

        self.process_unresolvable().await
    }

    /// Await every in-flight resolution and commit what can be committed
    pub async fn settle(&mut self) -> ObserverResult<()> {
        for entry in self.window.iter_mut() {
            entry.settle().await;
        }
        self.flush_processed().await
    }

    async fn read_after(&self, cursor: Option<&Transaction>) -> ObserverResult<(ReadResult, bool)> {
        let since = cursor.map(|t| t.transaction_number);
        let time_hash = cursor.map(|t| t.transaction_time_hash.as_str());

        match self.ledger.read(since, time_hash).await {
            Ok(read) => {
                tracing::debug!(
                    since = ?since,
                    count = read.transactions.len(),
                    more = read.more_transactions,
                    "Read transactions from ledger"
                );
                Ok((read, false))
            }
            Err(e) if e.is_invalid_cursor() => {
                tracing::warn!(since = ?since, error = %e, "Ledger rejected read cursor");
                Ok((ReadResult::default(), true))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run each time group through the limiter of its protocol version
    async fn select_qualified(&self, transactions: &[Transaction]) -> ObserverResult<Vec<Transaction>> {
        let mut groups: BTreeMap<u64, Vec<Transaction>> = BTreeMap::new();
        for transaction in transactions {
            groups
                .entry(transaction.transaction_time)
                .or_default()
                .push(transaction.clone());
        }

        let mut qualified = Vec::with_capacity(transactions.len());
        for (time, group) in groups {
            let selector = self.versions.transaction_selector(time)?;
            qualified.extend(selector.select_qualified_transactions(group).await?);
        }

        qualified.sort_by_key(|t| t.transaction_number);
        Ok(qualified)
    }

    fn dispatch(&mut self, transaction: Transaction) {
        tracing::debug!(
            transaction_number = transaction.transaction_number,
            anchor_string = %transaction.anchor_string,
            "Dispatching transaction"
        );
        self.window
            .push_back(TransactionUnderProcessing::spawn(transaction, self.context()));
    }

    fn context(&self) -> ProcessingContext {
        ProcessingContext {
            versions: Arc::clone(&self.versions),
            unresolvable_store: Arc::clone(&self.unresolvable_store),
            confirmation_store: Arc::clone(&self.confirmation_store),
        }
    }

    /// Only a cursor at or behind the ledger's tip indicates a reorganization;
    /// otherwise the ledger has not caught up yet.
    async fn is_reorganization(&self, cursor: Option<&Transaction>) -> ObserverResult<bool> {
        let Some(cursor) = cursor else {
            return Ok(true);
        };

        let latest = self.ledger.latest_time().await?;
        if cursor.transaction_time <= latest.time {
            return Ok(true);
        }

        tracing::info!(
            cursor_time = cursor.transaction_time,
            ledger_time = latest.time,
            "Ledger behind read cursor, waiting for it to catch up"
        );
        Ok(false)
    }

    /// Wait on the oldest in-flight resolutions until at most `max` remain
    async fn wait_for_capacity(&mut self, max: usize) {
        while self.window.iter().filter(|t| t.is_in_flight()).count() > max {
            if let Some(oldest) = self.window.iter_mut().find(|t| t.is_in_flight()) {
                oldest.settle().await;
            }
        }
    }

    /// Commit processed transactions from the front of the window
    async fn flush_processed(&mut self) -> ObserverResult<()> {
        while let Some(front) = self.window.front_mut() {
            front.refresh().await;
            if front.status != ProcessingStatus::Processed {
                break;
            }

            self.transaction_store.add_transaction(&front.transaction).await?;
            self.window.pop_front();
        }
        Ok(())
    }

    /// A bookkeeping failure blocks commits; start over from the last
    /// committed transaction
    async fn abandon_window(&mut self) -> ObserverResult<()> {
        self.settle().await?;

        for entry in self.window.iter().filter(|t| t.status == ProcessingStatus::Error) {
            tracing::error!(
                transaction_number = entry.transaction.transaction_number,
                anchor_string = %entry.transaction.anchor_string,
                "Transaction could not be recorded, re-reading from last committed transaction"
            );
        }

        self.window.clear();
        self.cursor = None;
        Ok(())
    }

    async fn process_unresolvable(&mut self) -> ObserverResult<()> {
        let due = self
            .unresolvable_store
            .due_for_retry(Some(self.config.max_retry_batch))
            .await?;
        if due.is_empty() {
            return Ok(());
        }

        tracing::info!(count = due.len(), "Retrying unresolvable transactions");

        let mut retries: Vec<TransactionUnderProcessing> = due
            .into_iter()
            .map(|transaction| TransactionUnderProcessing::spawn(transaction, self.context()))
            .collect();

        let mut failed = 0usize;
        for retry in retries.iter_mut() {
            retry.settle().await;
            if retry.status == ProcessingStatus::Error {
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(ObserverError::Internal(format!(
                "{} unresolvable transaction retries could not be recorded",
                failed
            )));
        }
        Ok(())
    }
}
