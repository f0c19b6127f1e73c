//! Durable storage for the challenge aggregate
//!
//! The engine itself never touches storage; callers load a [`ChallengeState`],
//! apply operations and save it back through a [`ChallengeStore`]. Dates are
//! the only persistence key for daily records.

use crate::challenge::{format_date, ChallengeState};
use crate::error::ChallengeError;
use crate::types::DailyProgress;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Narrow persistence contract for the challenge state and its daily records
pub trait ChallengeStore {
    /// Load the saved state, or `None` if nothing has been saved yet
    fn load_state(&self) -> Result<Option<ChallengeState>, ChallengeError>;

    fn save_state(&mut self, state: &ChallengeState) -> Result<(), ChallengeError>;

    fn load_day(&self, date: NaiveDate) -> Result<Option<DailyProgress>, ChallengeError>;

    fn save_day(&mut self, date: NaiveDate, progress: &DailyProgress) -> Result<(), ChallengeError>;

    /// Load the saved state or fall back to a fresh inactive one
    fn load_or_default(&self) -> Result<ChallengeState, ChallengeError> {
        Ok(self.load_state()?.unwrap_or_default())
    }
}

/// In-process store, mostly useful for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Option<ChallengeState>,
    days: BTreeMap<NaiveDate, DailyProgress>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChallengeStore for MemoryStore {
    fn load_state(&self) -> Result<Option<ChallengeState>, ChallengeError> {
        Ok(self.state.clone().map(|mut state| {
            for (date, progress) in &self.days {
                state.daily_progress.insert(*date, progress.clone());
            }
            state
        }))
    }

    fn save_state(&mut self, state: &ChallengeState) -> Result<(), ChallengeError> {
        self.days = state.daily_progress.clone();
        self.state = Some(state.clone());
        Ok(())
    }

    fn load_day(&self, date: NaiveDate) -> Result<Option<DailyProgress>, ChallengeError> {
        Ok(self.days.get(&date).cloned())
    }

    fn save_day(
        &mut self,
        date: NaiveDate,
        progress: &DailyProgress,
    ) -> Result<(), ChallengeError> {
        self.days.insert(date, progress.clone());
        Ok(())
    }
}

/// Stores the whole state as one pretty-printed JSON document.
///
/// `daily_progress` is keyed by `YYYY-MM-DD`. Writes go to a sibling temp
/// file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, state: &ChallengeState) -> Result<(), ChallengeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "challenge state saved");
        Ok(())
    }
}

impl ChallengeStore for JsonFileStore {
    fn load_state(&self) -> Result<Option<ChallengeState>, ChallengeError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&json)?;
        debug!(path = %self.path.display(), "challenge state loaded");
        Ok(Some(state))
    }

    fn save_state(&mut self, state: &ChallengeState) -> Result<(), ChallengeError> {
        self.write(state)
    }

    fn load_day(&self, date: NaiveDate) -> Result<Option<DailyProgress>, ChallengeError> {
        Ok(self
            .load_state()?
            .and_then(|state| state.daily_progress.get(&date).cloned()))
    }

    fn save_day(
        &mut self,
        date: NaiveDate,
        progress: &DailyProgress,
    ) -> Result<(), ChallengeError> {
        let mut state = self.load_or_default()?;
        state.daily_progress.insert(date, progress.clone());
        debug!(date = %format_date(date), "daily progress saved");
        self.write(&state)
    }
}
