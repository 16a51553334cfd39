use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use vigil_common::{EntityRef, HealthReport, ReportKey};

/// One tuple owned by a source, without the source itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnedTuple {
    pub entity: EntityRef,
    pub property: String,
}

/// What a [`ReportStore::transition`] closure wants done with the slot.
#[derive(Debug)]
pub enum Transition {
    Keep,
    Put(HealthReport),
    Remove,
}

#[derive(Clone, Default)]
pub struct ReportStore {
    reports: Arc<DashMap<ReportKey, HealthReport>>,
    by_source: Arc<DashMap<String, HashSet<OwnedTuple>>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, report: HealthReport) -> Option<HealthReport> {
        let key = report.key();
        self.index(&key);
        self.reports.insert(key, report)
    }

    pub fn get(&self, entity: &EntityRef, source_id: &str, property: &str) -> Option<HealthReport> {
        self.get_key(&ReportKey::new(entity.clone(), source_id, property))
    }

    pub fn get_key(&self, key: &ReportKey) -> Option<HealthReport> {
        self.reports.get(key).map(|r| r.clone())
    }

    pub fn remove(&self, key: &ReportKey) -> Option<HealthReport> {
        let removed = self.reports.remove(key).map(|(_, r)| r);
        if removed.is_some() {
            self.unindex(key);
        }
        removed
    }

    /// Atomic read-decide-write on one tuple. `f` runs while the slot is
    /// locked, so concurrent transitions on the same key are serialized.
    /// `f` must not touch this store.
    pub fn transition<F, R>(&self, key: &ReportKey, f: F) -> R
    where
        F: FnOnce(Option<&HealthReport>) -> (Transition, R),
    {
        match self.reports.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let (transition, out) = f(Some(slot.get()));
                match transition {
                    Transition::Keep => {}
                    Transition::Put(report) => {
                        self.index(key);
                        slot.insert(report);
                    }
                    Transition::Remove => {
                        slot.remove();
                        self.unindex(key);
                    }
                }
                out
            }
            Entry::Vacant(slot) => {
                let (transition, out) = f(None);
                if let Transition::Put(report) = transition {
                    self.index(key);
                    slot.insert(report);
                }
                out
            }
        }
    }

    /// Removes every report raised by `source_id`, ordered by key.
    pub fn remove_all_for_source(&self, source_id: &str) -> Vec<HealthReport> {
        let owned = self
            .by_source
            .remove(source_id)
            .map(|(_, tuples)| tuples)
            .unwrap_or_default();

        let mut removed: Vec<HealthReport> = owned
            .into_iter()
            .filter_map(|t| {
                let key = ReportKey::new(t.entity, source_id, t.property);
                self.reports.remove(&key).map(|(_, r)| r)
            })
            .collect();

        // Entries written while the index was being detached.
        let stragglers: Vec<ReportKey> = self
            .reports
            .iter()
            .filter(|e| e.key().source_id == source_id)
            .map(|e| e.key().clone())
            .collect();
        for key in stragglers {
            if let Some(report) = self.remove(&key) {
                removed.push(report);
            }
        }

        removed.sort_by(|a, b| a.key().cmp(&b.key()));
        removed
    }

    /// Lazy view over active reports matching `predicate`. Each call to
    /// [`ActiveReports::iter`] re-reads current state.
    pub fn list_active<P>(&self, predicate: P) -> ActiveReports<'_, P>
    where
        P: Fn(&HealthReport) -> bool,
    {
        ActiveReports {
            store: self,
            predicate,
        }
    }

    pub fn owned_by(&self, source_id: &str) -> Vec<OwnedTuple> {
        let mut tuples: Vec<OwnedTuple> = self
            .by_source
            .get(source_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        tuples.sort();
        tuples
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    fn index(&self, key: &ReportKey) {
        self.by_source
            .entry(key.source_id.clone())
            .or_default()
            .insert(OwnedTuple {
                entity: key.entity.clone(),
                property: key.property.clone(),
            });
    }

    fn unindex(&self, key: &ReportKey) {
        let tuple = OwnedTuple {
            entity: key.entity.clone(),
            property: key.property.clone(),
        };
        if let Some(mut set) = self.by_source.get_mut(&key.source_id) {
            set.remove(&tuple);
        }
        self.by_source
            .remove_if(&key.source_id, |_, set| set.is_empty());
    }
}

impl std::fmt::Debug for ReportStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportStore").field("len", &self.len()).finish()
    }
}

pub struct ActiveReports<'a, P> {
    store: &'a ReportStore,
    predicate: P,
}

impl<P> ActiveReports<'_, P>
where
    P: Fn(&HealthReport) -> bool,
{
    /// Holds shard read locks while iterating; do not write to the store
    /// from inside the loop.
    pub fn iter(&self) -> impl Iterator<Item = HealthReport> + '_ {
        self.store
            .reports
            .iter()
            .filter(|e| e.value().is_active() && (self.predicate)(e.value()))
            .map(|e| e.value().clone())
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vigil_common::HealthState;

    fn report(entity: EntityRef, source: &str, property: &str, refreshed: i64) -> HealthReport {
        HealthReport {
            report_id: format!("{source}-{property}"),
            entity,
            source_id: source.into(),
            property: property.into(),
            state: HealthState::Warning,
            code: Some("W".into()),
            message: String::new(),
            time_to_live: Duration::from_secs(60),
            created_at_ms: refreshed,
            last_refreshed_at_ms: refreshed,
            emit_ok: false,
        }
    }

    #[test]
    fn upsert_replaces_and_returns_previous() {
        let store = ReportStore::new();
        let disk = EntityRef::disk("C:");
        assert!(store.upsert(report(disk.clone(), "DiskObserver", "DiskSpacePercent", 1)).is_none());

        let prev = store
            .upsert(report(disk.clone(), "DiskObserver", "DiskSpacePercent", 2))
            .unwrap();
        assert_eq!(prev.last_refreshed_at_ms, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store
                .get(&disk, "DiskObserver", "DiskSpacePercent")
                .unwrap()
                .last_refreshed_at_ms,
            2
        );
    }

    #[test]
    fn remove_all_for_source_leaves_other_sources() {
        let store = ReportStore::new();
        store.upsert(report(EntityRef::disk("C:"), "DiskObserver", "DiskSpacePercent", 1));
        store.upsert(report(EntityRef::disk("D:"), "DiskObserver", "DiskSpacePercent", 1));
        store.upsert(report(EntityRef::node("n1"), "NodeObserver", "CpuPercent", 1));

        let removed = store.remove_all_for_source("DiskObserver");
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].entity, EntityRef::disk("C:"));
        assert_eq!(store.len(), 1);
        assert!(store.owned_by("DiskObserver").is_empty());
        assert_eq!(store.owned_by("NodeObserver").len(), 1);
    }

    #[test]
    fn remove_all_for_unknown_source_is_empty() {
        let store = ReportStore::new();
        assert!(store.remove_all_for_source("nobody").is_empty());
    }

    #[test]
    fn transition_remove_updates_index() {
        let store = ReportStore::new();
        let r = report(EntityRef::node("n1"), "NodeObserver", "CpuPercent", 1);
        let key = r.key();
        store.upsert(r);

        let seen = store.transition(&key, |prev| (Transition::Remove, prev.is_some()));
        assert!(seen);
        assert!(store.is_empty());
        assert!(store.owned_by("NodeObserver").is_empty());
    }

    #[test]
    fn transition_keep_on_vacant_writes_nothing() {
        let store = ReportStore::new();
        let key = ReportKey::new(EntityRef::node("n1"), "s", "p");
        store.transition(&key, |prev| {
            assert!(prev.is_none());
            (Transition::Keep, ())
        });
        assert!(store.is_empty());
        assert!(store.owned_by("s").is_empty());
    }

    #[test]
    fn list_active_is_restartable() {
        let store = ReportStore::new();
        store.upsert(report(EntityRef::disk("C:"), "DiskObserver", "DiskSpacePercent", 1));

        let view = store.list_active(|r| r.source_id == "DiskObserver");
        assert_eq!(view.count(), 1);

        store.upsert(report(EntityRef::disk("D:"), "DiskObserver", "DiskSpacePercent", 1));
        store.upsert(report(EntityRef::node("n1"), "NodeObserver", "CpuPercent", 1));
        assert_eq!(view.count(), 2);

        store.remove_all_for_source("DiskObserver");
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn clones_share_state() {
        let store = ReportStore::new();
        let other = store.clone();
        store.upsert(report(EntityRef::disk("C:"), "DiskObserver", "DiskSpacePercent", 1));
        assert_eq!(other.len(), 1);
    }
}
