//! Daily mood check-ins: at most one entry per local calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use super::{remote_failure, Orchestrator};
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::keys;
use crate::storage::{MoodEntry, MoodLevel, RecordId};

/// Index of the latest entry falling on `day`.
pub(crate) fn find_on_day(
    entries: &[MoodEntry],
    clock: &dyn Clock,
    day: NaiveDate,
) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| clock.local_date(entry.timestamp) == day)
        .max_by_key(|(_, entry)| entry.timestamp)
        .map(|(index, _)| index)
}

/// Apply a same-day selection to an existing entry. The id and chat link stay.
fn update_in_place(
    entry: &mut MoodEntry,
    mood: MoodLevel,
    chat_id: Option<RecordId>,
    now: DateTime<Utc>,
) {
    entry.mood = mood.tag();
    entry.timestamp = now;
    entry.updated_at = Some(now);
    if entry.chat_id.is_none() {
        entry.chat_id = chat_id;
    }
}

impl Orchestrator {
    /// Record today's mood, replacing an earlier selection from the same day.
    pub async fn save_mood_entry(
        &self,
        mood: MoodLevel,
        chat_id: Option<RecordId>,
    ) -> Result<MoodEntry> {
        let now = self.clock.now();
        let today = self.clock.local_date(now);

        if let Some(remote) = self.active_remote() {
            let entries = remote.list_mood_entries().await.map_err(remote_failure)?;
            let existing = find_on_day(&entries, self.clock.as_ref(), today)
                .and_then(|index| entries.into_iter().nth(index))
                .and_then(|entry| entry.id.clone().map(|id| (id, entry)));

            return match existing {
                Some((id, mut entry)) => {
                    update_in_place(&mut entry, mood, chat_id, now);
                    remote
                        .update_mood_entry(&id, &entry)
                        .await
                        .map_err(remote_failure)?;
                    debug!(%id, day = %today, "mood entry updated");
                    Ok(entry)
                }
                None => {
                    let mut entry = MoodEntry::new(mood.tag(), now, chat_id);
                    let id = remote.add_mood_entry(&entry).await.map_err(remote_failure)?;
                    debug!(%id, day = %today, "mood entry added");
                    entry.id = Some(id);
                    Ok(entry)
                }
            };
        }

        let mut history = self.local_moods()?;
        let entry = match find_on_day(&history, self.clock.as_ref(), today) {
            Some(index) => {
                update_in_place(&mut history[index], mood, chat_id, now);
                history[index].clone()
            }
            None => {
                let entry = MoodEntry::new(mood.tag(), now, chat_id);
                history.push(entry.clone());
                entry
            }
        };
        self.state.write_json(keys::MOOD_HISTORY, &history)?;
        debug!(day = %today, value = mood.value(), "local mood entry saved");
        Ok(entry)
    }

    /// All mood entries, oldest first.
    pub async fn get_mood_history(&self) -> Result<Vec<MoodEntry>> {
        let mut entries = match self.active_remote() {
            Some(remote) => match remote.list_mood_entries().await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(error = %err, "remote mood read failed, using local copy");
                    self.local_moods()?
                }
            },
            None => self.local_moods()?,
        };
        entries.sort_by_key(|entry| entry.timestamp);
        Ok(entries)
    }

    /// The entry for the current local day, if one exists.
    pub async fn get_todays_mood_entry(&self) -> Result<Option<MoodEntry>> {
        let entries = self.get_mood_history().await?;
        let today = self.clock.today();
        Ok(find_on_day(&entries, self.clock.as_ref(), today).map(|index| entries[index].clone()))
    }

    pub(super) fn local_moods(&self) -> Result<Vec<MoodEntry>> {
        self.state.read_collection(keys::MOOD_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{FixedOffset, TimeZone};

    fn entry_at(hour: u32, day: u32) -> MoodEntry {
        MoodEntry::new(
            MoodLevel::Okay.tag(),
            Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap(),
            None,
        )
    }

    #[test]
    fn test_find_on_day_uses_local_midnight() {
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap(),
        );
        // 02:00 UTC on the 15th is still the 14th at UTC-5.
        let entries = vec![entry_at(2, 15), entry_at(18, 15)];

        let day_14 = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let day_15 = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(find_on_day(&entries, &clock, day_14), Some(0));
        assert_eq!(find_on_day(&entries, &clock, day_15), Some(1));
    }

    #[test]
    fn test_find_on_day_prefers_latest_duplicate() {
        let clock = ManualClock::utc(Utc.with_ymd_and_hms(2026, 3, 15, 23, 0, 0).unwrap());
        let entries = vec![entry_at(20, 15), entry_at(8, 15), entry_at(9, 14)];

        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(find_on_day(&entries, &clock, day), Some(0));
    }

    #[test]
    fn test_update_in_place_keeps_chat_link() {
        let mut entry = entry_at(9, 15);
        entry.chat_id = Some(RecordId::from("chat-1"));
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 20, 0, 0).unwrap();

        update_in_place(&mut entry, MoodLevel::Low, Some(RecordId::from("chat-2")), now);

        assert_eq!(entry.mood.value, 2);
        assert_eq!(entry.timestamp, now);
        assert_eq!(entry.updated_at, Some(now));
        assert_eq!(entry.chat_id, Some(RecordId::from("chat-1")));
    }
}
