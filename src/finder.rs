//! ## Finder
//! The [Finder] runs a set of [RelationMatcher] against the read and write relations of a
//! statement. Matchers are partitioned by their [RelationKind], every pair of a read and a write
//! matcher sharing a label is then checked for accesses that bind at least one common label to
//! the same expression. Array names are not compared.

use std::{collections::BTreeSet, fmt};

use log::{debug, info, warn};

use crate::{
    constraints::{ConstraintsList, compare_lists, matcher_candidates},
    pretty_print::pretty_print,
    relation::{AccessMap, UnionMap},
    relation_matcher::{RelationKind, RelationMatcher},
};

/// A read and a write access that agree on at least one shared label. `agreed` holds exactly the
/// agreeing constraints, the accesses may still differ in other dimensions or in the array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    /// Index into [Finder::read_matchers].
    pub read_matcher: usize,
    /// Index into [Finder::write_matchers].
    pub write_matcher: usize,
    pub read_access: AccessMap,
    pub write_access: AccessMap,
    pub agreed: ConstraintsList,
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "read #{} {} / write #{} {}: {}",
            self.read_matcher,
            self.read_access,
            self.write_matcher,
            self.write_access,
            pretty_print(self.agreed.get_constraints())
        )
    }
}

#[derive(Debug)]
pub struct Finder {
    reads: UnionMap,
    writes: UnionMap,
    read_matchers: Vec<RelationMatcher>,
    write_matchers: Vec<RelationMatcher>,
    read_and_write_matchers: Vec<RelationMatcher>,
}

impl Finder {
    /// Create a finder over the accesses of one statement. Matchers of kind
    /// [RelationKind::ReadAndWrite] are additionally merged into both the read and the write
    /// partition.
    pub fn new(reads: UnionMap, writes: UnionMap, matchers: Vec<RelationMatcher>) -> Self {
        let mut read_matchers = Vec::new();
        let mut write_matchers = Vec::new();
        let mut read_and_write_matchers = Vec::new();
        for matcher in matchers {
            match matcher.get_kind() {
                RelationKind::Read => read_matchers.push(matcher),
                RelationKind::Write => write_matchers.push(matcher),
                RelationKind::ReadAndWrite => read_and_write_matchers.push(matcher),
            }
        }
        Self::merge(&mut read_matchers, &read_and_write_matchers);
        Self::merge(&mut write_matchers, &read_and_write_matchers);

        Self {
            reads,
            writes,
            read_matchers,
            write_matchers,
            read_and_write_matchers,
        }
    }

    fn merge(first: &mut Vec<RelationMatcher>, second: &[RelationMatcher]) {
        first.extend(second.iter().cloned());
    }

    pub fn get_size_read_matchers(&self) -> usize {
        self.read_matchers.len()
    }

    pub fn get_size_write_matchers(&self) -> usize {
        self.write_matchers.len()
    }

    pub fn get_size_read_and_write_matchers(&self) -> usize {
        self.read_and_write_matchers.len()
    }

    pub fn read_matchers(&self) -> &[RelationMatcher] {
        &self.read_matchers
    }

    pub fn write_matchers(&self) -> &[RelationMatcher] {
        &self.write_matchers
    }

    pub fn read_and_write_matchers(&self) -> &[RelationMatcher] {
        &self.read_and_write_matchers
    }

    /// Compare every read matcher with every write matcher it shares a label with. Each pair of
    /// accesses agreeing on at least one label is logged, returned and recorded as a binding of
    /// both matchers, in matcher then candidate order.
    pub fn find_and_print(&mut self) -> Vec<MatchReport> {
        let read_candidates: Vec<_> = self
            .read_matchers
            .iter()
            .map(|m| matcher_candidates(m, &self.reads))
            .collect();
        let write_candidates: Vec<_> = self
            .write_matchers
            .iter()
            .map(|m| matcher_candidates(m, &self.writes))
            .collect();

        for (idx, candidates) in read_candidates.iter().enumerate() {
            if candidates.is_empty() {
                warn!(
                    "No read access applies to {}",
                    pretty_print(&self.read_matchers[idx])
                );
            }
        }
        for (idx, candidates) in write_candidates.iter().enumerate() {
            if candidates.is_empty() {
                warn!(
                    "No write access applies to {}",
                    pretty_print(&self.write_matchers[idx])
                );
            }
        }

        let mut reports = Vec::new();
        // (matcher, candidate) pairs that still have to be recorded via `set_dims`.
        let mut read_bindings = BTreeSet::new();
        let mut write_bindings = BTreeSet::new();
        for (r_idx, r_matcher) in self.read_matchers.iter().enumerate() {
            for (w_idx, w_matcher) in self.write_matchers.iter().enumerate() {
                if !r_matcher.shares_label(w_matcher) {
                    debug!("Read #{} and write #{} share no label", r_idx, w_idx);
                    continue;
                }
                for (r_cand, (r_access, r_list)) in read_candidates[r_idx].iter().enumerate() {
                    for (w_cand, (w_access, w_list)) in write_candidates[w_idx].iter().enumerate() {
                        let agreed = compare_lists(r_list, w_list);
                        if agreed.is_empty() {
                            continue;
                        }
                        let report = MatchReport {
                            read_matcher: r_idx,
                            write_matcher: w_idx,
                            read_access: (*r_access).clone(),
                            write_access: (*w_access).clone(),
                            agreed,
                        };
                        info!("Match: {}", report);
                        reports.push(report);
                        read_bindings.insert((r_idx, r_cand));
                        write_bindings.insert((w_idx, w_cand));
                    }
                }
            }
        }

        Self::record(&mut self.read_matchers, &read_candidates, read_bindings);
        Self::record(&mut self.write_matchers, &write_candidates, write_bindings);
        info!(
            "Found {} matching access pairs for {} read and {} write matchers",
            reports.len(),
            self.read_matchers.len(),
            self.write_matchers.len()
        );
        reports
    }

    fn record(
        matchers: &mut [RelationMatcher],
        candidates: &[Vec<(&AccessMap, ConstraintsList)>],
        bindings: BTreeSet<(usize, usize)>,
    ) {
        for (m_idx, cand_idx) in bindings {
            let (_, list) = &candidates[m_idx][cand_idx];
            matchers[m_idx].set_dims(list.get_constraints());
            matchers[m_idx].set();
        }
    }
}
