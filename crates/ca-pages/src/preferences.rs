//! UI preferences persisted in session storage.
//!
//! Preferences live as one JSON object under the `store` key. Writes are
//! ignored until [`PreferenceStore::load`] has run, so defaults never
//! overwrite a stored value before it was read.

use ca_core::{CaError, Result, SessionStorage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Session storage key of the preferences blob
pub const STORE_KEY: &str = "store";

/// Every persisted preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Whether the navigation drawer is expanded
    #[serde(default)]
    pub side_drawer_open: bool,

    /// Whether lists include deactivated entries
    #[serde(default)]
    pub include_inactive: bool,
}

impl Preferences {
    #[must_use]
    pub const fn get(&self, key: PreferenceKey) -> bool {
        match key {
            PreferenceKey::SideDrawerOpen => self.side_drawer_open,
            PreferenceKey::IncludeInactive => self.include_inactive,
        }
    }

    fn set(&mut self, key: PreferenceKey, value: bool) {
        match key {
            PreferenceKey::SideDrawerOpen => self.side_drawer_open = value,
            PreferenceKey::IncludeInactive => self.include_inactive = value,
        }
    }
}

/// Name of a single preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    SideDrawerOpen,
    IncludeInactive,
}

impl PreferenceKey {
    pub const ALL: [Self; 2] = [Self::SideDrawerOpen, Self::IncludeInactive];

    /// Field name inside the stored blob
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SideDrawerOpen => "sideDrawerOpen",
            Self::IncludeInactive => "includeInactive",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = CaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sideDrawerOpen" | "side-drawer-open" | "side_drawer_open" => Ok(Self::SideDrawerOpen),
            "includeInactive" | "include-inactive" | "include_inactive" => {
                Ok(Self::IncludeInactive)
            }
            other => Err(CaError::Config(format!("unknown preference: {other}"))),
        }
    }
}

/// In-memory preferences backed by session storage
pub struct PreferenceStore {
    storage: Arc<dyn SessionStorage>,
    current: Preferences,
    loaded: bool,
}

impl PreferenceStore {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            current: Preferences::default(),
            loaded: false,
        }
    }

    /// Apply the stored blob, if any, and enable saving
    pub fn load(&mut self) -> Result<Preferences> {
        if let Some(raw) = self.storage.get_item(STORE_KEY)? {
            match serde_json::from_str::<Preferences>(&raw) {
                Ok(stored) => self.current = stored,
                Err(e) => warn!(error = %e, "ignoring unreadable preferences"),
            }
        }
        self.loaded = true;
        Ok(self.current)
    }

    /// Persist one value, keeping every other stored field
    pub fn save(&self, key: PreferenceKey, value: bool) -> Result<()> {
        if !self.loaded {
            debug!(%key, "preferences not loaded yet, skipping save");
            return Ok(());
        }

        let mut blob = match self.storage.get_item(STORE_KEY)? {
            Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => default_blob()?,
            },
            None => default_blob()?,
        };
        blob.insert(key.as_str().to_string(), serde_json::Value::Bool(value));

        self.storage
            .set_item(STORE_KEY, &serde_json::Value::Object(blob).to_string())
    }

    /// Update the in-memory value and persist it
    pub fn set(&mut self, key: PreferenceKey, value: bool) -> Result<()> {
        self.current.set(key, value);
        self.save(key, value)
    }

    #[must_use]
    pub const fn get(&self, key: PreferenceKey) -> bool {
        self.current.get(key)
    }

    #[must_use]
    pub const fn preferences(&self) -> Preferences {
        self.current
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }
}

fn default_blob() -> Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::to_value(Preferences::default())? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}
