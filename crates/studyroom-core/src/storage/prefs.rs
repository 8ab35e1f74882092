//! Local key/value slots.
//!
//! Small pieces of device-local state, each JSON-encoded under a fixed key
//! in the database's `kv` table. A missing or undecodable slot reads as its
//! default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Database;
use crate::error::Result;
use crate::timer::PersistedTimer;

pub const THEME_KEY: &str = "theme";
pub const SCRATCHPAD_KEY: &str = "scratchpad";
pub const TIMER_STATE_KEY: &str = "timerState";
pub const TASKS_KEY: &str = "tasks";
pub const AUTO_MODE_KEY: &str = "autoMode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}' (expected light or dark)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

pub struct LocalPrefs<'a> {
    db: &'a Database,
}

impl<'a> LocalPrefs<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.db.kv_get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring undecodable local slot");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.db.kv_set(key, &raw)?;
        Ok(())
    }

    pub fn theme(&self) -> Result<Theme> {
        Ok(self.read(THEME_KEY)?.unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.write(THEME_KEY, &theme)
    }

    pub fn scratchpad(&self) -> Result<String> {
        Ok(self.read(SCRATCHPAD_KEY)?.unwrap_or_default())
    }

    pub fn set_scratchpad(&self, text: &str) -> Result<()> {
        self.write(SCRATCHPAD_KEY, &text)
    }

    pub fn timer_state(&self) -> Result<Option<PersistedTimer>> {
        self.read(TIMER_STATE_KEY)
    }

    pub fn save_timer_state(&self, state: &PersistedTimer) -> Result<()> {
        self.write(TIMER_STATE_KEY, state)
    }

    pub fn clear_timer_state(&self) -> Result<()> {
        self.db.kv_delete(TIMER_STATE_KEY)?;
        Ok(())
    }

    pub fn auto_mode(&self) -> Result<bool> {
        Ok(self.read(AUTO_MODE_KEY)?.unwrap_or(false))
    }

    pub fn set_auto_mode(&self, enabled: bool) -> Result<()> {
        self.write(AUTO_MODE_KEY, &enabled)
    }

    pub fn tasks(&self) -> Result<Vec<TodoItem>> {
        Ok(self.read(TASKS_KEY)?.unwrap_or_default())
    }

    pub fn set_tasks(&self, tasks: &[TodoItem]) -> Result<()> {
        self.write(TASKS_KEY, &tasks)
    }

    /// Append a to-do item; blank text is ignored.
    pub fn add_task(&self, text: &str) -> Result<Vec<TodoItem>> {
        let mut tasks = self.tasks()?;
        let text = text.trim();
        if !text.is_empty() {
            tasks.push(TodoItem {
                text: text.to_string(),
                done: false,
            });
            self.set_tasks(&tasks)?;
        }
        Ok(tasks)
    }

    /// Mark the item at `index` done. Returns `false` for a bad index.
    pub fn complete_task(&self, index: usize) -> Result<bool> {
        let mut tasks = self.tasks()?;
        let Some(task) = tasks.get_mut(index) else {
            return Ok(false);
        };
        task.done = true;
        self.set_tasks(&tasks)?;
        Ok(true)
    }

    /// Remove the item at `index`. Returns `false` for a bad index.
    pub fn remove_task(&self, index: usize) -> Result<bool> {
        let mut tasks = self.tasks()?;
        if index >= tasks.len() {
            return Ok(false);
        }
        tasks.remove(index);
        self.set_tasks(&tasks)?;
        Ok(true)
    }
}
