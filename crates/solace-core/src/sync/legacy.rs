//! Encrypt journal entries written before encryption existed.
//!
//! Old builds kept entries as plaintext JSON under `journal_entries`. Each one
//! is sealed into the active backend (ids already present are left alone) and
//! the plaintext is removed. Entries that could not be moved stay behind under
//! the legacy key so nothing is lost and the next run picks them up.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use super::migration::RecordFailure;
use super::Orchestrator;
use crate::error::{Result, SolaceError};
use crate::storage::keys;
use crate::storage::{JournalEntry, RecordId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LegacyMigrationReport {
    /// Entries sealed and written.
    pub encrypted: usize,
    /// Entries whose id already had an encrypted record.
    pub skipped: usize,
    pub failures: Vec<RecordFailure>,
    /// The plaintext collection no longer exists.
    pub legacy_removed: bool,
}

impl Orchestrator {
    /// Move plaintext entries into encrypted storage. A no-op when none exist.
    pub async fn legacy_plaintext_migration(&self) -> Result<LegacyMigrationReport> {
        let Some(raw_entries) = self
            .state
            .read_json::<Vec<serde_json::Value>>(keys::LEGACY_JOURNAL_ENTRIES)?
        else {
            return Ok(LegacyMigrationReport {
                legacy_removed: true,
                ..LegacyMigrationReport::default()
            });
        };

        let mut report = LegacyMigrationReport::default();
        let mut leftovers = Vec::new();

        if !raw_entries.is_empty() {
            let key = self.active_key()?;
            let mut existing: HashSet<RecordId> = self
                .journal_records()
                .await?
                .into_iter()
                .map(|record| record.id)
                .collect();

            for raw in raw_entries {
                let entry = match serde_json::from_value::<JournalEntry>(raw.clone()) {
                    Ok(entry) => entry,
                    Err(err) => {
                        let err = SolaceError::from(err);
                        warn!(error = %err, "legacy journal entry is malformed");
                        report.failures.push(RecordFailure::new(None, &err));
                        leftovers.push(raw);
                        continue;
                    }
                };
                if existing.contains(&entry.id) {
                    report.skipped += 1;
                    continue;
                }

                let stored = match self.seal_record(&entry, &key, self.clock.now()) {
                    Ok(record) => self.store_record(&record).await,
                    Err(err) => Err(err),
                };
                match stored {
                    Ok(()) => {
                        existing.insert(entry.id);
                        report.encrypted += 1;
                    }
                    Err(err) => {
                        warn!(id = %entry.id, error = %err, "legacy journal entry not encrypted");
                        report.failures.push(RecordFailure::new(Some(entry.id), &err));
                        leftovers.push(raw);
                    }
                }
            }
        }

        if leftovers.is_empty() {
            self.state.local().remove(keys::LEGACY_JOURNAL_ENTRIES)?;
            report.legacy_removed = true;
        } else {
            self.state
                .write_json(keys::LEGACY_JOURNAL_ENTRIES, &leftovers)?;
        }

        info!(
            encrypted = report.encrypted,
            skipped = report.skipped,
            remaining = leftovers.len(),
            "legacy journal entries processed"
        );
        Ok(report)
    }
}
