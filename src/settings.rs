use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChimeTone {
    Bell,
    Soft,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChimeSettings {
    pub enabled: bool,
    pub volume: f32,
    pub tone: ChimeTone,
}

impl Default for ChimeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.6,
            tone: ChimeTone::Bell,
        }
    }
}

impl ChimeSettings {
    fn normalized(mut self) -> Self {
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            ChimeSettings::default().volume
        };
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    chime: ChimeSettings,
}

/// User preferences kept in `settings.json`, separate from cycle state.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn chime(&self) -> ChimeSettings {
        self.data
            .read()
            .map(|guard| guard.chime.clone().normalized())
            .unwrap_or_default()
    }

    pub fn update_chime(&self, settings: ChimeSettings) -> Result<ChimeSettings> {
        let settings = settings.normalized();
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        let previous = std::mem::replace(&mut guard.chime, settings.clone());
        if let Err(err) = self.persist(&guard) {
            guard.chime = previous;
            return Err(err);
        }
        Ok(settings)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.chime(), ChimeSettings::default());
    }

    #[test]
    fn test_update_persists_and_clamps_volume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let saved = store
            .update_chime(ChimeSettings {
                enabled: false,
                volume: 3.0,
                tone: ChimeTone::Soft,
            })
            .unwrap();
        assert_eq!(saved.volume, 1.0);

        let reopened = SettingsStore::new(path).unwrap();
        let chime = reopened.chime();
        assert!(!chime.enabled);
        assert_eq!(chime.volume, 1.0);
        assert_eq!(chime.tone, ChimeTone::Soft);
    }

    #[test]
    fn test_garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ nope").unwrap();

        let store = SettingsStore::new(path).unwrap();

        assert_eq!(store.chime(), ChimeSettings::default());
    }
}
