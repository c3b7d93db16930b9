use crate::chart::standard_chart;
use crate::error::LedgerError;
use crate::mapping::{check_balanced, map_event};
use core_types::{Account, TransactionRecord};
use database::{LedgerRepository, ResolvedEntry, TransactionInsert};
use events::EventEnvelope;
use std::collections::HashMap;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Owns the chart of accounts for every merchant.
///
/// Accounts are created lazily and idempotently on first use; calling
/// `ensure_accounts` before every posting is safe and expected.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    repo: LedgerRepository,
}

impl AccountRegistry {
    pub fn new(repo: LedgerRepository) -> Self {
        Self { repo }
    }

    /// Creates the standard chart of accounts for a merchant if absent.
    pub async fn ensure_accounts(&self, merchant_id: Uuid) -> Result<(), LedgerError> {
        for def in standard_chart() {
            let account = Account {
                id: Uuid::new_v4(),
                merchant_id,
                code: def.code.to_string(),
                name: def.name.to_string(),
                account_type: def.account_type,
                category: def.category,
            };
            self.repo.upsert_account(&account).await?;
        }
        debug!(%merchant_id, "chart of accounts ensured");
        Ok(())
    }

    /// Fetches the merchant's accounts keyed by taxonomy code.
    pub async fn account_map(
        &self,
        merchant_id: Uuid,
    ) -> Result<HashMap<String, Account>, LedgerError> {
        let accounts = self.repo.accounts_for_merchant(merchant_id).await?;
        Ok(accounts
            .into_iter()
            .map(|account| (account.code.clone(), account))
            .collect())
    }
}

/// The outcome of posting one event.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    /// A new balanced transaction was committed.
    Posted(TransactionRecord),
    /// The event was already posted; the existing transaction is returned
    /// and nothing was written. Not an error.
    Duplicate(TransactionRecord),
}

impl PostOutcome {
    pub fn transaction(&self) -> &TransactionRecord {
        match self {
            PostOutcome::Posted(tx) | PostOutcome::Duplicate(tx) => tx,
        }
    }
}

/// Converts events into committed, balanced ledger transactions.
#[derive(Debug, Clone)]
pub struct LedgerPoster {
    repo: LedgerRepository,
    registry: AccountRegistry,
}

impl LedgerPoster {
    pub fn new(repo: LedgerRepository) -> Self {
        let registry = AccountRegistry::new(repo.clone());
        Self { repo, registry }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Maps one event to a balanced transaction and commits it.
    ///
    /// Either every entry is written or none is; a failed posting leaves no
    /// partial state and can be retried as-is.
    pub async fn post_event(&self, envelope: &EventEnvelope) -> Result<PostOutcome, LedgerError> {
        // --- 1. Pure mapping & validation ---
        let mapped = map_event(envelope)?;

        // --- 2. Balance invariant, re-verified at the commit boundary ---
        if let Err(e) = check_balanced(&mapped.entries) {
            error!(
                event_id = %envelope.event_id,
                merchant_id = %envelope.merchant_id,
                "imbalanced posting rejected: {e}"
            );
            return Err(e);
        }

        // --- 3. Resolve account codes against the merchant's chart ---
        self.registry.ensure_accounts(envelope.merchant_id).await?;
        let accounts = self.registry.account_map(envelope.merchant_id).await?;

        let mut entries = Vec::with_capacity(mapped.entries.len());
        for draft in &mapped.entries {
            let account = accounts.get(&draft.account_code).ok_or_else(|| {
                LedgerError::MissingAccount(draft.account_code.clone(), envelope.merchant_id)
            })?;
            entries.push(ResolvedEntry {
                id: Uuid::new_v4(),
                account_id: account.id,
                amount: draft.amount,
                direction: draft.direction,
                attribution: draft.attribution.clone(),
            });
        }

        // --- 4. Archive the raw event, then commit atomically ---
        self.repo.insert_event(envelope).await?;

        let record = TransactionRecord {
            id: Uuid::new_v4(),
            merchant_id: envelope.merchant_id,
            event_id: envelope.event_id.clone(),
            // Ledger time is event time, so windowed analytics see postings
            // where the business activity happened.
            created_at: envelope.recorded_at,
            description: mapped.description.clone(),
        };

        match self.repo.insert_transaction(&record, &entries).await? {
            TransactionInsert::Inserted => {
                debug!(event_id = %envelope.event_id, tx_id = %record.id, "event posted");
                Ok(PostOutcome::Posted(record))
            }
            TransactionInsert::DuplicateOf(existing) => {
                info!(
                    event_id = %envelope.event_id,
                    tx_id = %existing.id,
                    "duplicate event, returning existing transaction"
                );
                Ok(PostOutcome::Duplicate(existing))
            }
        }
    }
}
