use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::types::{HistoryEntry, MemberStatus};

/// Status history of one user in one committee, ordered by `since`.
///
/// Entries sharing a timestamp keep their insertion order, so the later
/// one wins a lookup at that instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History(Vec<HistoryEntry>);

/// Histories of all users of a committee, keyed by nickname.
pub type Histories = HashMap<String, History>;

impl History {
    pub fn new(mut entries: Vec<HistoryEntry>) -> Self {
        // stable sort keeps insertion order for equal timestamps
        entries.sort_by_key(|e| e.since);
        History(entries)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most recently effective status, if any was ever recorded.
    pub fn latest(&self) -> Option<MemberStatus> {
        self.0.last().map(|e| e.status)
    }

    /// Append `status` from `since` on unless it equals the latest status.
    /// Returns whether an entry was added.
    pub fn record(&mut self, status: MemberStatus, since: DateTime<Utc>) -> bool {
        if self.latest() == Some(status) {
            return false;
        }
        let idx = self.0.partition_point(|e| e.since <= since);
        self.0.insert(idx, HistoryEntry { since, status });
        true
    }

    /// Status in effect at `when`: the latest entry not after `when`,
    /// `NoMember` before the first entry.
    pub fn status_at(&self, when: DateTime<Utc>) -> MemberStatus {
        match self.0.partition_point(|e| e.since <= when) {
            0 => MemberStatus::NoMember,
            idx => self.0[idx - 1].status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()
    }

    fn history() -> History {
        History::new(vec![
            HistoryEntry { since: t(20), status: MemberStatus::Member },
            HistoryEntry { since: t(10), status: MemberStatus::Voting },
            HistoryEntry { since: t(25), status: MemberStatus::NoMember },
        ])
    }

    #[test]
    fn empty_history_is_no_member() {
        assert_eq!(History::default().status_at(t(1)), MemberStatus::NoMember);
        assert_eq!(History::default().latest(), None);
    }

    #[test]
    fn lookup_takes_latest_entry_not_after_query() {
        let h = history();
        assert_eq!(h.status_at(t(9)), MemberStatus::NoMember);
        assert_eq!(h.status_at(t(10)), MemberStatus::Voting);
        assert_eq!(h.status_at(t(15)), MemberStatus::Voting);
        assert_eq!(h.status_at(t(20)), MemberStatus::Member);
        assert_eq!(h.status_at(t(24)), MemberStatus::Member);
        assert_eq!(h.status_at(t(28)), MemberStatus::NoMember);
        assert_eq!(h.latest(), Some(MemberStatus::NoMember));
    }

    #[test]
    fn lookup_never_sees_later_entries() {
        let h = history();
        let mut when = t(1);
        let mut seen = Vec::new();
        while when <= t(28) {
            let status = h.status_at(when);
            if let Some(entry) = h.entries().iter().rev().find(|e| e.since <= when) {
                assert_eq!(entry.status, status);
            } else {
                assert_eq!(status, MemberStatus::NoMember);
            }
            if seen.last() != Some(&status) {
                seen.push(status);
            }
            when += Duration::hours(6);
        }
        // statuses appear in the order they were recorded
        assert_eq!(
            seen,
            vec![
                MemberStatus::NoMember,
                MemberStatus::Voting,
                MemberStatus::Member,
                MemberStatus::NoMember
            ]
        );
    }

    #[test]
    fn record_skips_repeated_status() {
        let mut h = History::default();
        assert!(h.record(MemberStatus::Member, t(1)));
        assert!(!h.record(MemberStatus::Member, t(2)));
        assert!(h.record(MemberStatus::Voting, t(3)));
        assert_eq!(h.entries().len(), 2);
    }

    #[test]
    fn same_instant_entries_resolve_to_the_later_one() {
        let mut h = History::default();
        h.record(MemberStatus::Member, t(5));
        h.record(MemberStatus::Voting, t(5));
        assert_eq!(h.status_at(t(5)), MemberStatus::Voting);
    }
}
