use std::sync::Arc;

use log::{debug, warn};

use crate::cycle::{PhaseConfig, PhaseConfigUpdate};

use super::{KeyValueStore, COMPLETED_CYCLES_KEY, PHASE_CONFIG_KEY};

/// Cycle-facing view of a [`KeyValueStore`].
///
/// None of these calls fail: a failed or unreadable load yields the default,
/// a failed save is logged and the caller keeps its in-memory value.
#[derive(Clone)]
pub struct CyclePersistence {
    store: Arc<dyn KeyValueStore>,
}

impl CyclePersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load_config(&self) -> PhaseConfig {
        match self.store.get(PHASE_CONFIG_KEY).await {
            Ok(Some(raw)) => decode_config(&raw).unwrap_or_else(|| {
                warn!("Stored phase config is invalid, using defaults");
                PhaseConfig::default()
            }),
            Ok(None) => PhaseConfig::default(),
            Err(err) => {
                warn!("Failed to load phase config, using defaults: {err:#}");
                PhaseConfig::default()
            }
        }
    }

    pub async fn save_config(&self, config: &PhaseConfig) {
        let encoded = match serde_json::to_string(config) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!("Failed to encode phase config: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(PHASE_CONFIG_KEY, &encoded).await {
            warn!("Failed to save phase config, keeping it in memory only: {err:#}");
        } else {
            debug!("Saved phase config {encoded}");
        }
    }

    pub async fn load_completed_cycles(&self) -> u32 {
        match self.store.get(COMPLETED_CYCLES_KEY).await {
            Ok(Some(raw)) => decode_completed_cycles(&raw).unwrap_or_else(|| {
                warn!("Stored completed-cycle count '{raw}' is invalid, using 0");
                0
            }),
            Ok(None) => 0,
            Err(err) => {
                warn!("Failed to load completed cycles, using 0: {err:#}");
                0
            }
        }
    }

    pub async fn save_completed_cycles(&self, count: u32) {
        if let Err(err) = self
            .store
            .set(COMPLETED_CYCLES_KEY, &count.to_string())
            .await
        {
            warn!("Failed to save completed cycles ({count}), keeping it in memory only: {err:#}");
        }
    }
}

/// Stored config may be partial (older writers); missing fields take defaults.
pub(crate) fn decode_config(raw: &str) -> Option<PhaseConfig> {
    let update = PhaseConfigUpdate::from_json(raw).ok()?;
    PhaseConfig::default().merged(&update).ok()
}

/// Accepts `4`, `"4"` and surrounding whitespace.
pub(crate) fn decode_completed_cycles(raw: &str) -> Option<u32> {
    raw.trim().trim_matches('"').trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn persistence() -> (CyclePersistence, MemoryStore) {
        let store = MemoryStore::new();
        (CyclePersistence::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let (persistence, _) = persistence();
        assert_eq!(persistence.load_config().await, PhaseConfig::default());
        assert_eq!(persistence.load_completed_cycles().await, 0);
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let (persistence, store) = persistence();
        let config = PhaseConfig {
            focus_duration_seconds: 3000,
            short_break_duration_seconds: 420,
            long_break_duration_seconds: 1800,
            cycles_before_long_break: 1,
        };

        persistence.save_config(&config).await;

        assert_eq!(persistence.load_config().await, config);
        let raw: serde_json::Value =
            serde_json::from_str(&store.raw(PHASE_CONFIG_KEY).unwrap()).unwrap();
        assert_eq!(raw["focusDurationSeconds"], 3000);
        assert_eq!(raw["cyclesBeforeLongBreak"], 1);
    }

    #[tokio::test]
    async fn test_counter_round_trip_and_encodings() {
        let (persistence, store) = persistence();
        persistence.save_completed_cycles(9).await;
        assert_eq!(store.raw(COMPLETED_CYCLES_KEY).as_deref(), Some("9"));
        assert_eq!(persistence.load_completed_cycles().await, 9);

        store.insert_raw(COMPLETED_CYCLES_KEY, "\"12\"");
        assert_eq!(persistence.load_completed_cycles().await, 12);

        store.insert_raw(COMPLETED_CYCLES_KEY, "-3");
        assert_eq!(persistence.load_completed_cycles().await, 0);
    }

    #[tokio::test]
    async fn test_partial_and_invalid_stored_config() {
        let (persistence, store) = persistence();

        store.insert_raw(PHASE_CONFIG_KEY, r#"{"focusDurationSeconds": 600}"#);
        let loaded = persistence.load_config().await;
        assert_eq!(loaded.focus_duration_seconds, 600);
        assert_eq!(loaded.short_break_duration_seconds, 300);

        store.insert_raw(PHASE_CONFIG_KEY, r#"{"focusDurationSeconds": 0}"#);
        assert_eq!(persistence.load_config().await, PhaseConfig::default());

        store.insert_raw(PHASE_CONFIG_KEY, "{broken");
        assert_eq!(persistence.load_config().await, PhaseConfig::default());
    }

    #[tokio::test]
    async fn test_unavailable_store_never_fails() {
        let (persistence, store) = persistence();
        persistence.save_completed_cycles(3).await;
        store.set_failing(true);

        persistence.save_completed_cycles(4).await;
        persistence.save_config(&PhaseConfig::default()).await;
        assert_eq!(persistence.load_completed_cycles().await, 0);
        assert_eq!(persistence.load_config().await, PhaseConfig::default());

        store.set_failing(false);
        assert_eq!(persistence.load_completed_cycles().await, 3);
    }
}
