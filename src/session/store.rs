//! Bounded, in-memory store of visitor sessions.
//!
//! Sessions live behind a cookie sid in an LRU map: there is no persistence
//! and no background sweeper; stale visitors either get reset on their next
//! `/state` touch or fall off the LRU end.

// Author: kelexine (https://github.com/kelexine)

use super::{SessionStats, VisitorSession};
use crate::config::SessionConfig;
use crate::error::{Result, StudioError};
use crate::models::api::SettingsUpdate;
use crate::models::mapping::{map_model, AspectRatio};
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

pub struct SessionStore {
    config: SessionConfig,
    sessions: Mutex<LruCache<String, VisitorSession>>,
    stats: Mutex<SessionStats>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            sessions: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(SessionStats::default()),
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Run `apply` against the visitor's session, materializing a fresh one
    /// (and evicting the coldest, if at capacity) when the sid is new.
    fn with_session<T>(&self, sid: &str, apply: impl FnOnce(&mut VisitorSession) -> T) -> T {
        let mut sessions = self.sessions.lock();

        if !sessions.contains(sid) {
            debug!("Materializing fresh session for sid {}", sid);
            let mut stats = self.stats.lock();
            stats.created += 1;
            if sessions.len() == sessions.cap().get() {
                stats.evictions += 1;
                crate::metrics::record_session_event("evicted");
            }
            drop(stats);
            crate::metrics::record_session_event("created");
            sessions.push(sid.to_string(), VisitorSession::fresh(Self::now()));
        }

        // The entry is guaranteed present; get_mut also refreshes recency.
        let result = sessions
            .get_mut(sid)
            .map(apply)
            .expect("session entry disappeared under lock");

        crate::metrics::update_active_sessions(sessions.len());
        result
    }

    /// Snapshot without touching activity. Used by every endpoint except the
    /// state view.
    pub fn snapshot(&self, sid: &str) -> VisitorSession {
        self.with_session(sid, |session| session.clone())
    }

    /// State-view touch: applies the idle rule, then stamps activity. A
    /// visitor returning after the idle timeout starts with a clean working
    /// set (tab and ratio choice survive).
    pub fn touch(&self, sid: &str) -> VisitorSession {
        let idle_secs = self.config.idle_timeout_minutes * 60;
        let now = Self::now();

        let (session, was_idle) = self.with_session(sid, |session| {
            let was_idle = now - session.last_activity > idle_secs;
            if was_idle {
                info!("New visit detected for sid {}: clearing old refs/results", sid);
                session.clear_working_set();
            }
            session.last_activity = now;
            (session.clone(), was_idle)
        });

        if was_idle {
            self.stats.lock().idle_resets += 1;
            crate::metrics::record_session_event("idle_reset");
        }

        session
    }

    /// Store the results of a successful generation.
    pub fn set_results(&self, sid: &str, images: Vec<String>, save_images: bool) {
        self.with_session(sid, |session| {
            session.results = images;
            session.save_images = save_images;
        });
    }

    /// Apply a settings update. Switching tabs always clears results and the
    /// save flag; pending references survive only when the new tab's model is
    /// also reference-driven.
    pub fn update_settings(&self, sid: &str, update: &SettingsUpdate) -> Result<VisitorSession> {
        if let Some(index) = update.aspect_ratio_index {
            if index >= AspectRatio::ALL.len() {
                return Err(StudioError::InvalidRequest(
                    "Índice de proporción inválido.".to_string(),
                ));
            }
        }

        let new_model = match update.active_tab.as_deref() {
            Some(tab) => Some((tab, map_model(tab)?)),
            None => None,
        };

        Ok(self.with_session(sid, |session| {
            if let Some((tab, model)) = new_model {
                session.active_tab = tab.to_string();
                session.results.clear();
                session.save_images = false;

                if !model.requires_reference() {
                    session.reference_images.clear();
                    debug!("Cleared refs on switch to non-ref model: {}", tab);
                } else {
                    debug!("Preserved refs on switch to ref model: {}", tab);
                }
            }
            if let Some(index) = update.aspect_ratio_index {
                session.aspect_ratio_index = index;
            }
            if let Some(save) = update.save_images {
                session.save_images = save;
            }
            session.clone()
        }))
    }

    /// Append a reference image, enforcing the cap and rejecting duplicates
    /// (by content fingerprint) and unusable data URLs.
    pub fn add_reference(&self, sid: &str, data_url: &str) -> Result<Vec<String>> {
        const LIMIT_MESSAGE: &str =
            "Límite de 3 imágenes de referencia alcanzado o imagen inválida.";

        if crate::imaging::parse_data_url(data_url).is_err() {
            warn!("Rejected reference for sid {}: not a usable data URL", sid);
            return Err(StudioError::InvalidRequest(LIMIT_MESSAGE.to_string()));
        }

        let max = self.config.max_reference_images;
        let fingerprint = Self::fingerprint(data_url);

        self.with_session(sid, |session| {
            if session.reference_images.len() >= max {
                warn!(
                    "Reference limit reached for sid {} (count: {})",
                    sid,
                    session.reference_images.len()
                );
                return Err(StudioError::InvalidRequest(LIMIT_MESSAGE.to_string()));
            }

            let duplicate = session
                .reference_images
                .iter()
                .any(|existing| Self::fingerprint(existing) == fingerprint);
            if duplicate {
                warn!("Reference already present in session for sid {}", sid);
            } else {
                session.reference_images.push(data_url.to_string());
                debug!(
                    "Added reference image for sid {}. Current count: {}",
                    sid,
                    session.reference_images.len()
                );
            }

            Ok(session.reference_images.clone())
        })
    }

    /// Remove a reference by index.
    pub fn remove_reference(&self, sid: &str, index: usize) -> Result<Vec<String>> {
        self.with_session(sid, |session| {
            if index >= session.reference_images.len() {
                warn!("Invalid reference index {} for sid {}", index, sid);
                return Err(StudioError::InvalidRequest(
                    "Índice de imagen de referencia inválido.".to_string(),
                ));
            }
            session.reference_images.remove(index);
            debug!(
                "Removed reference image {} for sid {}. Current count: {}",
                index,
                sid,
                session.reference_images.len()
            );
            Ok(session.reference_images.clone())
        })
    }

    /// Full reset: the entry is dropped and a default session materializes on
    /// the visitor's next touch.
    pub fn reset(&self, sid: &str) {
        let removed = self.sessions.lock().pop(sid).is_some();
        if removed {
            info!("Reset complete for sid {}", sid);
            crate::metrics::record_session_event("reset");
        }
        crate::metrics::update_active_sessions(self.sessions.lock().len());
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    fn fingerprint(data_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data_url.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    #[cfg(test)]
    fn backdate(&self, sid: &str, seconds: i64) {
        self.with_session(sid, |session| {
            session.last_activity -= seconds;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{blank_canvas, to_data_url};
    use crate::models::mapping::default_tab;

    fn store() -> SessionStore {
        SessionStore::new(SessionConfig::default())
    }

    fn reference(pixel_seed: u8) -> String {
        // Vary content so fingerprints differ
        let mut png = blank_canvas(AspectRatio::Square).unwrap();
        png.push(pixel_seed);
        to_data_url("image/png", &png)
    }

    #[test]
    fn test_fresh_session_defaults() {
        let store = store();
        let session = store.snapshot("sid-1");
        assert_eq!(session.active_tab, default_tab());
        assert!(session.results.is_empty());
        assert!(session.reference_images.is_empty());
        assert!(!session.save_images);
        assert_eq!(session.aspect_ratio_index, 0);
        assert_eq!(store.stats().created, 1);
    }

    #[test]
    fn test_touch_resets_idle_working_set() {
        let store = store();
        store.set_results("sid-1", vec!["data:image/png;base64,QQ==".to_string()], true);
        store.backdate("sid-1", 31 * 60);

        let session = store.touch("sid-1");
        assert!(session.results.is_empty());
        assert!(!session.save_images);
        assert_eq!(store.stats().idle_resets, 1);
    }

    #[test]
    fn test_touch_keeps_recent_working_set() {
        let store = store();
        store.set_results("sid-1", vec!["data:image/png;base64,QQ==".to_string()], true);

        let session = store.touch("sid-1");
        assert_eq!(session.results.len(), 1);
        assert!(session.save_images);
        assert_eq!(store.stats().idle_resets, 0);
    }

    #[test]
    fn test_tab_switch_to_non_ref_model_clears_refs() {
        let store = store();
        store.add_reference("sid-1", &reference(1)).unwrap();

        let update = SettingsUpdate {
            active_tab: Some("Texto a Imagen Ultra (v3.5)".to_string()),
            ..Default::default()
        };
        let session = store.update_settings("sid-1", &update).unwrap();
        assert!(session.reference_images.is_empty());
        assert!(session.results.is_empty());
    }

    #[test]
    fn test_tab_switch_to_ref_model_preserves_refs() {
        let store = store();
        store.add_reference("sid-1", &reference(1)).unwrap();
        store.set_results("sid-1", vec!["data:image/png;base64,QQ==".to_string()], true);

        let update = SettingsUpdate {
            active_tab: Some("Edición Mágica (Nano)".to_string()),
            ..Default::default()
        };
        let session = store.update_settings("sid-1", &update).unwrap();
        assert_eq!(session.reference_images.len(), 1);
        // Results and save flag still reset on any switch
        assert!(session.results.is_empty());
        assert!(!session.save_images);
    }

    #[test]
    fn test_unknown_tab_is_rejected() {
        let store = store();
        let update = SettingsUpdate {
            active_tab: Some("No existe".to_string()),
            ..Default::default()
        };
        assert!(store.update_settings("sid-1", &update).is_err());
    }

    #[test]
    fn test_aspect_ratio_index_bounds() {
        let store = store();
        let update = SettingsUpdate {
            aspect_ratio_index: Some(AspectRatio::ALL.len()),
            ..Default::default()
        };
        assert!(store.update_settings("sid-1", &update).is_err());

        let update = SettingsUpdate {
            aspect_ratio_index: Some(2),
            ..Default::default()
        };
        let session = store.update_settings("sid-1", &update).unwrap();
        assert_eq!(session.aspect_ratio_index, 2);
    }

    #[test]
    fn test_reference_cap() {
        let store = store();
        for i in 0..3 {
            store.add_reference("sid-1", &reference(i)).unwrap();
        }
        assert!(store.add_reference("sid-1", &reference(9)).is_err());
        assert_eq!(store.snapshot("sid-1").reference_images.len(), 3);
    }

    #[test]
    fn test_duplicate_reference_not_stored_twice() {
        let store = store();
        let image = reference(1);
        let after_first = store.add_reference("sid-1", &image).unwrap();
        let after_second = store.add_reference("sid-1", &image).unwrap();
        assert_eq!(after_first.len(), 1);
        assert_eq!(after_second.len(), 1);
    }

    #[test]
    fn test_invalid_data_url_rejected() {
        let store = store();
        assert!(store.add_reference("sid-1", "not a data url").is_err());
    }

    #[test]
    fn test_remove_reference_bounds() {
        let store = store();
        store.add_reference("sid-1", &reference(1)).unwrap();
        assert!(store.remove_reference("sid-1", 5).is_err());
        let remaining = store.remove_reference("sid-1", 0).unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_reset_drops_entry() {
        let store = store();
        store.set_results("sid-1", vec!["data:image/png;base64,QQ==".to_string()], true);
        store.reset("sid-1");
        assert!(store.is_empty());

        // Next touch materializes a default session again
        let session = store.snapshot("sid-1");
        assert!(session.results.is_empty());
        assert_eq!(session.aspect_ratio_index, 0);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let store = SessionStore::new(SessionConfig {
            max_sessions: 2,
            ..Default::default()
        });
        store.snapshot("sid-1");
        store.snapshot("sid-2");
        store.snapshot("sid-3");
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 1);
    }
}
