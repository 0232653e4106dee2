//! Per-field option cache with issue-order race resolution.
//!
//! Every issued load carries a token from a per-field monotonically
//! increasing counter. A completion may only commit while its token is
//! still the field's most recently issued one; completions may arrive in
//! any physical order, but only the newest issue ever wins. Invalidation
//! also advances the counter, so an in-flight load cannot commit into an
//! entry that was cleared after it was issued.

use std::collections::BTreeMap;

use formwork_model::{FieldSpec, OptionItem};

/// Load lifecycle of one field's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No load issued since construction or the last invalidation.
    #[default]
    Idle,
    /// A load is outstanding; any previous entry stays visible meanwhile.
    Pending,
    /// The most recent load committed successfully.
    Loaded,
    /// The most recent load failed; the entry is an empty list.
    Failed,
}

/// What happened to a delivered load result.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Result committed; the entry now holds the delivered list.
    Committed,
    /// Failure committed; the entry is now empty and marked failed.
    Failed { error: String },
    /// The result's token was superseded; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Default)]
struct Entry {
    /// Committed list; `None` until the first commit.
    items: Option<Vec<OptionItem>>,
    state: LoadState,
    /// Most recently issued token. Monotonic per engine lifetime.
    seq: u64,
}

/// Field name to most recently committed option list, with the issue
/// sequencing that guards commits.
#[derive(Debug, Clone, Default)]
pub struct OptionCache {
    entries: BTreeMap<String, Entry>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new load for `field` and return its token. The previous
    /// entry, if any, stays visible until the new result commits.
    pub fn begin_load(&mut self, field: &str) -> u64 {
        let entry = self.entries.entry(field.to_string()).or_default();
        entry.seq += 1;
        entry.state = LoadState::Pending;
        tracing::debug!(field = %field, token = entry.seq, "issuing option load");
        entry.seq
    }

    /// Deliver a load result. Commits only if `token` is still the most
    /// recently issued one for `field`.
    pub fn commit(
        &mut self,
        field: &str,
        token: u64,
        result: Result<Vec<OptionItem>, String>,
    ) -> CommitOutcome {
        let Some(entry) = self.entries.get_mut(field) else {
            tracing::debug!(field = %field, token, "discarding result for unknown entry");
            return CommitOutcome::Stale;
        };
        if token != entry.seq {
            tracing::debug!(
                field = %field,
                token,
                current = entry.seq,
                "discarding stale option result"
            );
            return CommitOutcome::Stale;
        }
        match result {
            Ok(items) => {
                entry.items = Some(items);
                entry.state = LoadState::Loaded;
                CommitOutcome::Committed
            }
            Err(error) => {
                tracing::warn!(field = %field, error = %error, "option load failed");
                entry.items = Some(Vec::new());
                entry.state = LoadState::Failed;
                CommitOutcome::Failed { error }
            }
        }
    }

    /// Drop `field`'s entry and supersede any load still in flight.
    pub fn invalidate(&mut self, field: &str) {
        let entry = self.entries.entry(field.to_string()).or_default();
        entry.seq += 1;
        entry.items = None;
        entry.state = LoadState::Idle;
    }

    /// Committed list for `field`, if one exists.
    pub fn options_for(&self, field: &str) -> Option<&[OptionItem]> {
        self.entries
            .get(field)
            .and_then(|entry| entry.items.as_deref())
    }

    pub fn state(&self, field: &str) -> LoadState {
        self.entries
            .get(field)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// List the rendering collaborator should see for a field: the
    /// committed entry, else the spec's static list, else nothing.
    pub fn effective_options(&self, spec: &FieldSpec) -> Vec<OptionItem> {
        if let Some(items) = self.options_for(&spec.name) {
            return items.to_vec();
        }
        spec.options
            .static_items()
            .map(<[OptionItem]>::to_vec)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(values: &[&str]) -> Vec<OptionItem> {
        values.iter().map(|v| OptionItem::from_value(*v)).collect()
    }

    #[test]
    fn commit_requires_the_latest_token() {
        let mut cache = OptionCache::new();
        let first = cache.begin_load("city");
        let second = cache.begin_load("city");

        // Older issue resolves after the newer one.
        assert_eq!(
            cache.commit("city", second, Ok(items(&["b"]))),
            CommitOutcome::Committed
        );
        assert_eq!(
            cache.commit("city", first, Ok(items(&["a"]))),
            CommitOutcome::Stale
        );
        assert_eq!(cache.options_for("city"), Some(items(&["b"]).as_slice()));
        assert_eq!(cache.state("city"), LoadState::Loaded);
    }

    #[test]
    fn stale_failure_cannot_clobber_a_fresh_success() {
        let mut cache = OptionCache::new();
        let first = cache.begin_load("city");
        let second = cache.begin_load("city");

        assert_eq!(
            cache.commit("city", second, Ok(items(&["b"]))),
            CommitOutcome::Committed
        );
        assert_eq!(
            cache.commit("city", first, Err("boom".to_string())),
            CommitOutcome::Stale
        );
        assert_eq!(cache.options_for("city"), Some(items(&["b"]).as_slice()));
        assert_eq!(cache.state("city"), LoadState::Loaded);
    }

    #[test]
    fn failure_commits_an_empty_list() {
        let mut cache = OptionCache::new();
        let token = cache.begin_load("city");

        let outcome = cache.commit("city", token, Err("network down".to_string()));

        assert!(matches!(outcome, CommitOutcome::Failed { .. }));
        assert_eq!(cache.options_for("city"), Some(&[][..]));
        assert_eq!(cache.state("city"), LoadState::Failed);
    }

    #[test]
    fn pending_load_keeps_previous_entry_visible() {
        let mut cache = OptionCache::new();
        let token = cache.begin_load("city");
        cache.commit("city", token, Ok(items(&["a"])));

        cache.begin_load("city");

        assert_eq!(cache.options_for("city"), Some(items(&["a"]).as_slice()));
        assert_eq!(cache.state("city"), LoadState::Pending);
    }

    #[test]
    fn invalidate_supersedes_an_in_flight_load() {
        let mut cache = OptionCache::new();
        let token = cache.begin_load("city");
        cache.invalidate("city");

        assert_eq!(
            cache.commit("city", token, Ok(items(&["late"]))),
            CommitOutcome::Stale
        );
        assert_eq!(cache.options_for("city"), None);
        assert_eq!(cache.state("city"), LoadState::Idle);
    }

    #[test]
    fn tokens_stay_monotonic_across_invalidation() {
        let mut cache = OptionCache::new();
        let first = cache.begin_load("city");
        cache.invalidate("city");
        let second = cache.begin_load("city");
        assert!(second > first);
    }
}
