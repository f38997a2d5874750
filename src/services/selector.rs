use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::models::announcement::Announcement;

use super::{
    dismissals::DismissalStore,
    metrics::{DISMISSALS_COUNTER, STORE_ERRORS_COUNTER},
};

/// First announcement, in list order, whose id has not been dismissed.
pub fn select_next<'a>(
    announcements: Option<&'a [Announcement]>,
    dismissed: &HashSet<String>,
) -> Option<&'a Announcement> {
    announcements?
        .iter()
        .find(|a| !dismissed.contains(&a.id))
}

/// Tracks which single announcement a client currently sees.
///
/// The dismissal set is mirrored in memory: a failed store read keeps the last
/// good set, and a failed write still hides the dismissed announcement for the
/// rest of the session.
pub struct AnnouncementSelector<S> {
    store: S,
    announcements: Vec<Announcement>,
    dismissed: HashSet<String>,
    current: Option<Announcement>,
}

impl<S: DismissalStore> AnnouncementSelector<S> {
    pub fn new(store: S) -> Self {
        let mut selector = Self {
            store,
            announcements: Vec::new(),
            dismissed: HashSet::new(),
            current: None,
        };
        selector.refresh_dismissed();
        selector
    }

    pub fn with_announcements(store: S, announcements: Option<Vec<Announcement>>) -> Self {
        let mut selector = Self::new(store);
        selector.on_configuration_changed(announcements);
        selector
    }

    pub fn current(&self) -> Option<&Announcement> {
        self.current.as_ref()
    }

    pub fn dismissed(&self) -> &HashSet<String> {
        &self.dismissed
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    /// Replaces the configured list and recomputes the selection.
    pub fn on_configuration_changed(
        &mut self,
        announcements: Option<Vec<Announcement>>,
    ) -> Option<&Announcement> {
        match announcements {
            Some(list) if !list.is_empty() => {
                self.announcements = list;
                self.refresh_dismissed();
                self.reselect();
            }
            _ => {
                self.announcements.clear();
                self.current = None;
            }
        }
        self.current.as_ref()
    }

    /// Dismisses the displayed announcement and advances to the next eligible one.
    ///
    /// Without a displayed announcement this is a no-op.
    pub fn on_dismiss(&mut self) -> Option<&Announcement> {
        let Some(id) = self.current.as_ref().map(|a| a.id.clone()) else {
            debug!("Dismiss requested with no active announcement");
            return None;
        };

        if let Err(e) = self.store.write_dismissed(&id) {
            warn!("Failed to persist dismissal of '{}': {}", id, e);
            STORE_ERRORS_COUNTER.with_label_values(&["write"]).inc();
        }
        self.dismissed.insert(id.clone());

        self.refresh_dismissed();
        self.reselect();
        let outcome = if self.current.is_some() { "advanced" } else { "exhausted" };
        DISMISSALS_COUNTER.with_label_values(&[outcome]).inc();
        info!(
            "Announcement '{}' dismissed, now showing {:?}",
            id,
            self.current.as_ref().map(|a| a.id.as_str())
        );
        self.current.as_ref()
    }

    fn reselect(&mut self) {
        self.current = select_next(Some(self.announcements.as_slice()), &self.dismissed).cloned();
    }

    /// Merges the store's view into the mirror. The set never shrinks.
    fn refresh_dismissed(&mut self) {
        match self.store.read_dismissed() {
            Ok(ids) => self.dismissed.extend(ids),
            Err(e) => {
                warn!("Failed to read dismissed announcements: {}", e);
                STORE_ERRORS_COUNTER.with_label_values(&["read"]).inc();
            }
        }
    }
}
