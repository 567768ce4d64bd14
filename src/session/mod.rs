// Per-visitor session state
// Author: kelexine (https://github.com/kelexine)

mod store;

pub use store::SessionStore;

use crate::models::mapping;

/// Everything the studio remembers about one visitor.
#[derive(Debug, Clone)]
pub struct VisitorSession {
    /// Display name of the selected model tab.
    pub active_tab: String,
    /// Results of the most recent successful generation, as `data:` URLs.
    pub results: Vec<String>,
    /// Pending reference images, as `data:` URLs. Capped at the configured
    /// maximum; never contains duplicates.
    pub reference_images: Vec<String>,
    /// Whether the visitor wants results remembered for download.
    pub save_images: bool,
    /// Index into `AspectRatio::ALL`.
    pub aspect_ratio_index: usize,
    /// Unix timestamp of the last `/state` touch.
    pub last_activity: i64,
}

impl VisitorSession {
    pub fn fresh(now: i64) -> Self {
        Self {
            active_tab: mapping::default_tab().to_string(),
            results: Vec::new(),
            reference_images: Vec::new(),
            save_images: false,
            aspect_ratio_index: 0,
            last_activity: now,
        }
    }

    /// Drop everything tied to the current working set, keeping the tab and
    /// ratio choice. Used for the idle-visit reset.
    pub fn clear_working_set(&mut self) {
        self.results.clear();
        self.reference_images.clear();
        self.save_images = false;
    }
}

/// Counters surfaced through `/metrics`.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Sessions materialized for new visitors.
    pub created: u64,
    /// Working sets cleared because the visitor came back after the idle
    /// timeout.
    pub idle_resets: u64,
    /// Sessions evicted because the store hit its size cap.
    pub evictions: u64,
}
