//! Decide which upstream commits are candidates for the next sync.
//!
//! Reconciliation is pure: it takes the fetched history and the project
//! metadata and never touches the filesystem or the network.

use templatamus_core::types::{AppliedCommits, CommitInfo, ProjectMetadata};

/// Where the anchor commit (`source_commit`) was found in the fetched history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Index of the anchor in the chronologically sorted history.
    Found { position: usize },
    /// The anchor is not in the fetched history (rewritten upstream, or older
    /// than the fetch window). Every fetched commit is a candidate unless it is
    /// already applied.
    Missing,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Unapplied commits newer than the anchor, oldest first.
    pub candidates: Vec<CommitInfo>,
    pub anchor: Anchor,
    /// Size of the history the candidates were picked from.
    pub fetched: usize,
}

impl Reconciliation {
    pub fn is_up_to_date(&self) -> bool {
        self.candidates.is_empty()
    }

    /// `true` when the anchor was not found and candidates come from the
    /// applied-set filter alone.
    pub fn is_degraded(&self) -> bool {
        self.anchor == Anchor::Missing
    }
}

/// Sort `history` oldest first and select the commits still to apply.
pub fn reconcile(mut history: Vec<CommitInfo>, metadata: &ProjectMetadata) -> Reconciliation {
    sort_chronologically(&mut history);
    let fetched = history.len();

    let anchor = match history.iter().position(|c| c.id == metadata.source_commit) {
        Some(position) => Anchor::Found { position },
        None => {
            let fallback = if metadata.applied_commits.is_empty() {
                "offering every fetched commit"
            } else {
                "falling back to the applied-commits list"
            };
            tracing::warn!(
                "anchor commit {} not found in the {fetched} fetched commit(s) of {}@{}; {fallback}",
                metadata.source_commit.short(),
                metadata.source_repo,
                metadata.source_branch
            );
            Anchor::Missing
        }
    };

    let skip = match anchor {
        Anchor::Found { position } => position + 1,
        Anchor::Missing => 0,
    };
    let candidates = history
        .into_iter()
        .skip(skip)
        .filter(|c| !metadata.is_applied(&c.id))
        .collect();

    Reconciliation {
        candidates,
        anchor,
        fetched,
    }
}

/// Oldest first by author date. The sort is stable, so commits sharing a
/// timestamp keep the order the source returned them in.
pub fn sort_chronologically(commits: &mut [CommitInfo]) {
    commits.sort_by_key(|c| c.date);
}

/// Set `is_applied` on every commit whose id is in `applied`.
pub fn mark_applied(commits: &mut [CommitInfo], applied: &AppliedCommits) {
    for commit in commits {
        commit.is_applied = applied.contains(&commit.id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;
    use templatamus_core::types::CommitId;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn commit(id: &str, day: u32) -> CommitInfo {
        CommitInfo {
            id: CommitId::from(id),
            message: format!("Change {id}\n\nbody"),
            author: "Jane".into(),
            date: at(day),
            url: String::new(),
            is_applied: false,
        }
    }

    /// c1..c5 on consecutive days, returned newest first like the API does.
    fn history() -> Vec<CommitInfo> {
        (1..=5)
            .rev()
            .map(|n| commit(&format!("c{n}"), n))
            .collect()
    }

    fn metadata(anchor: &str, applied: &[&str]) -> ProjectMetadata {
        let mut m = ProjectMetadata::new("acme/web-starter", "main", CommitId::from(anchor));
        for id in applied {
            m.record_applied(CommitId::from(*id), at(20));
        }
        m
    }

    fn ids(commits: &[CommitInfo]) -> Vec<&str> {
        commits.iter().map(|c| c.id.as_str()).collect()
    }

    #[rstest]
    #[case::fresh_anchor("c1", &[], &["c2", "c3", "c4", "c5"])]
    #[case::partially_applied("c1", &["c3"], &["c2", "c4", "c5"])]
    #[case::anchor_is_head("c5", &[], &[])]
    #[case::all_applied("c2", &["c3", "c4", "c5"], &[])]
    fn candidates_follow_the_anchor(
        #[case] anchor: &str,
        #[case] applied: &[&str],
        #[case] expected: &[&str],
    ) {
        let r = reconcile(history(), &metadata(anchor, applied));
        assert_eq!(ids(&r.candidates), expected);
        assert!(!r.is_degraded());
        assert_eq!(r.fetched, 5);
    }

    #[test]
    fn missing_anchor_falls_back_to_applied_set() {
        let r = reconcile(history(), &metadata("gone", &["c1", "c3"]));
        assert_eq!(r.anchor, Anchor::Missing);
        assert!(r.is_degraded());
        assert_eq!(ids(&r.candidates), ["c2", "c4", "c5"]);
    }

    #[test]
    fn missing_anchor_with_empty_applied_list_offers_everything() {
        let mut m = metadata("gone", &[]);
        m.applied_commits = AppliedCommits::new();
        let r = reconcile(history(), &m);
        assert!(r.is_degraded());
        assert_eq!(ids(&r.candidates), ["c1", "c2", "c3", "c4", "c5"]);
    }

    #[test]
    fn commits_older_than_the_anchor_are_never_candidates() {
        let mut hist = history();
        hist.push(commit("c0", 1));
        let r = reconcile(hist, &metadata("c3", &[]));
        assert_eq!(ids(&r.candidates), ["c4", "c5"]);
    }

    #[test]
    fn equal_timestamps_keep_source_order() {
        let hist = vec![commit("a", 2), commit("b", 2), commit("anchor", 1)];
        let r = reconcile(hist, &metadata("anchor", &[]));
        assert_eq!(ids(&r.candidates), ["a", "b"]);
    }

    #[test]
    fn reconciling_twice_gives_the_same_result() {
        let m = metadata("c2", &["c4"]);
        let first = reconcile(history(), &m);
        let second = reconcile(history(), &m);
        assert_eq!(ids(&first.candidates), ids(&second.candidates));
        assert_eq!(first.anchor, second.anchor);
    }

    #[test]
    fn empty_history_is_up_to_date_but_degraded() {
        let r = reconcile(Vec::new(), &metadata("c1", &[]));
        assert!(r.is_up_to_date());
        assert!(r.is_degraded());
        assert_eq!(r.fetched, 0);
    }

    #[test]
    fn mark_applied_flags_members_only() {
        let mut hist = history();
        let m = metadata("c1", &["c4"]);
        mark_applied(&mut hist, &m.applied_commits);
        let flagged: Vec<_> = hist
            .iter()
            .filter(|c| c.is_applied)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(flagged.len(), 2);
        assert!(flagged.contains(&"c1"));
        assert!(flagged.contains(&"c4"));
    }
}
