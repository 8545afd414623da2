//! ## Constraints
//! A constraint is introduced by an access and a [RelationMatcher]: the pair `(i, e)` states that
//! the dimension of the access labelled `i` by the matcher is the expression `e`. This module
//! builds such constraints from concrete access relations and compares constraint lists of
//! different matchers with each other. The key exported items are:
//! - [ConstraintsList] the constraints derived from one access
//! - [build_matcher_constraints] and [build_all_matcher_constraints] to derive them
//! - [compare_lists] to find the constraints two lists agree on

use bitvec::{bitvec, vec::BitVec};
use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    affine::AffineExpr,
    relation::{AccessMap, UnionMap},
    relation_matcher::RelationMatcher,
};

/// A single `(label, expression)` binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    label: char,
    expr: AffineExpr,
}

impl Constraint {
    pub fn new(label: char, expr: AffineExpr) -> Self {
        Self { label, expr }
    }

    pub fn get_label(&self) -> char {
        self.label
    }

    pub fn get_expr(&self) -> &AffineExpr {
        &self.expr
    }
}

/// The constraints derived from a single access, one per label position of the matcher.
///
/// A list without involved dimensions is the empty result: no access could be bound at all, or
/// two compared lists did not agree on anything. It is rendered with `-1` involved dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintsList {
    dims_involved: Option<usize>,
    constraints: Vec<Constraint>,
}

impl ConstraintsList {
    /// The empty result.
    pub fn empty() -> Self {
        Self {
            dims_involved: None,
            constraints: Vec::new(),
        }
    }

    fn new(dims_involved: usize, constraints: Vec<Constraint>) -> Self {
        Self {
            dims_involved: Some(dims_involved),
            constraints,
        }
    }

    /// The arity of the access this list was built for, `None` for the empty result.
    pub fn get_dims_involved(&self) -> Option<usize> {
        self.dims_involved
    }

    pub fn is_empty(&self) -> bool {
        self.dims_involved.is_none()
    }

    pub fn get_constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Obtain the expression of the first constraint labelled `label`.
    pub fn get(&self, label: char) -> Option<&AffineExpr> {
        self.constraints
            .iter()
            .find(|c| c.label == label)
            .map(|c| &c.expr)
    }
}

/// Pair every label of `matcher` with the corresponding output dimension of `access`. Fails if a
/// label that occurs several times is bound to different expressions.
fn bind_access(matcher: &RelationMatcher, access: &AccessMap) -> Option<ConstraintsList> {
    let mut seen: FxHashMap<char, &AffineExpr> = FxHashMap::default();
    let mut constraints = Vec::with_capacity(matcher.num_labels());
    for (label, expr) in matcher.get_labels().iter().zip(access.iter_dims()) {
        if let Some(previous) = seen.insert(*label, expr) {
            if previous != expr {
                debug!(
                    "Label {} bound to both {} and {} in {}",
                    label,
                    previous.linear_form(),
                    expr.linear_form(),
                    access
                );
                return None;
            }
        }
        constraints.push(Constraint::new(*label, expr.clone()));
    }
    Some(ConstraintsList::new(access.arity(), constraints))
}

/// Bind `matcher` against every individual map of `accesses` that it applies to, returning the
/// map together with its constraints.
pub(crate) fn matcher_candidates<'a>(
    matcher: &RelationMatcher,
    accesses: &'a UnionMap,
) -> Vec<(&'a AccessMap, ConstraintsList)> {
    matcher
        .get_accesses(accesses)
        .into_iter()
        .filter_map(|access| bind_access(matcher, access).map(|list| (access, list)))
        .collect()
}

/// Build the constraints of `matcher` for every applicable individual map of `accesses`, in the
/// order the maps appear in the union.
pub fn build_all_matcher_constraints(
    matcher: &RelationMatcher,
    accesses: &UnionMap,
) -> Vec<ConstraintsList> {
    matcher_candidates(matcher, accesses)
        .into_iter()
        .map(|(_, list)| list)
        .collect()
}

/// Build the constraints of `matcher` for the last applicable individual map of `accesses`. If no
/// map applies the result is [ConstraintsList::empty].
pub fn build_matcher_constraints(matcher: &RelationMatcher, accesses: &UnionMap) -> ConstraintsList {
    build_all_matcher_constraints(matcher, accesses)
        .pop()
        .unwrap_or_else(ConstraintsList::empty)
}

/// Compute the constraints `list_one` and `list_two` agree on, that is the entries of `list_one`
/// for which `list_two` has an entry with the same label and an equal expression. Every entry of
/// `list_two` is used at most once.
///
/// Lists of different arity, or without any common entry, yield [ConstraintsList::empty].
pub fn compare_lists(list_one: &ConstraintsList, list_two: &ConstraintsList) -> ConstraintsList {
    let dims = match (list_one.dims_involved, list_two.dims_involved) {
        (Some(one), Some(two)) if one == two => one,
        (Some(one), Some(two)) => {
            debug!("Cannot compare constraint lists of arity {} and {}", one, two);
            return ConstraintsList::empty();
        }
        _ => return ConstraintsList::empty(),
    };

    let mut used: BitVec = bitvec![0; list_two.constraints.len()];
    let mut agreed = Vec::new();
    for constraint in list_one.constraints.iter() {
        let partner = list_two
            .constraints
            .iter()
            .enumerate()
            .position(|(idx, other)| !used[idx] && other == constraint);
        if let Some(idx) = partner {
            used.set(idx, true);
            agreed.push(constraint.clone());
        }
    }

    if agreed.is_empty() {
        ConstraintsList::empty()
    } else {
        ConstraintsList::new(dims, agreed)
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::{
        affine::{AffineExpr, Tuple},
        relation::{AccessMap, UnionMap},
        relation_matcher::{read, write},
    };

    use super::{
        Constraint, ConstraintsList, build_all_matcher_constraints, build_matcher_constraints,
        compare_lists,
    };

    fn s_ij() -> Rc<Tuple> {
        Rc::new(Tuple::new("S", vec!["i".to_string(), "j".to_string()]))
    }

    #[test]
    fn build_test() {
        let s = s_ij();
        let e0 = AffineExpr::dim(s.clone(), 0);
        let e1 = AffineExpr::dim(s.clone(), 1) + 1;
        let accesses = UnionMap::of_vec(vec![AccessMap::new(
            s,
            "A",
            vec![e0.clone(), e1.clone()],
        )]);

        let list = build_matcher_constraints(&read(&['a', 'b']), &accesses);
        assert_eq!(list.get_dims_involved(), Some(2));
        assert_eq!(
            list.get_constraints(),
            &[Constraint::new('a', e0), Constraint::new('b', e1)]
        );
    }

    #[test]
    fn build_no_candidate_test() {
        let s = s_ij();
        let accesses = UnionMap::of_vec(vec![AccessMap::new(
            s.clone(),
            "A",
            vec![AffineExpr::dim(s, 0)],
        )]);
        let list = build_matcher_constraints(&read(&['a', 'b']), &accesses);
        assert!(list.is_empty());
        assert_eq!(list.get_dims_involved(), None);
        assert_eq!(list, ConstraintsList::empty());
        assert!(build_matcher_constraints(&read(&['a']), &UnionMap::new()).is_empty());
    }

    #[test]
    fn build_multiple_candidates_test() {
        let s = s_ij();
        let i = AffineExpr::dim(s.clone(), 0);
        let j = AffineExpr::dim(s.clone(), 1);
        let accesses = UnionMap::of_vec(vec![
            AccessMap::new(s.clone(), "A", vec![i.clone()]),
            AccessMap::new(s.clone(), "B", vec![i.clone(), j.clone()]),
            AccessMap::new(s, "C", vec![j.clone()]),
        ]);
        let matcher = read(&['x']);

        let all = build_all_matcher_constraints(&matcher, &accesses);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].get('x'), Some(&i));
        assert_eq!(all[1].get('x'), Some(&j));

        let last = build_matcher_constraints(&matcher, &accesses);
        assert_eq!(last, all[1]);
    }

    #[test]
    fn repeated_label_test() {
        let s = s_ij();
        let i = AffineExpr::dim(s.clone(), 0);
        let j = AffineExpr::dim(s.clone(), 1);
        let accesses = UnionMap::of_vec(vec![
            AccessMap::new(s.clone(), "A", vec![i.clone(), j.clone()]),
            AccessMap::new(s, "B", vec![i.clone(), i.clone()]),
        ]);

        let diagonal = build_all_matcher_constraints(&read(&['i', 'i']), &accesses);
        assert_eq!(diagonal.len(), 1);
        assert_eq!(
            diagonal[0].get_constraints(),
            &[Constraint::new('i', i.clone()), Constraint::new('i', i)]
        );
        assert_eq!(build_all_matcher_constraints(&read(&['i', 'j']), &accesses).len(), 2);
    }

    #[test]
    fn consistency_test() {
        let s = Rc::new(Tuple::new("S", vec!["s0".to_string()]));
        let s0 = AffineExpr::dim(s.clone(), 0);
        let reads = UnionMap::of_vec(vec![AccessMap::new(s.clone(), "A", vec![s0.clone()])]);
        let writes = UnionMap::of_vec(vec![AccessMap::new(s.clone(), "A", vec![s0.clone()])]);
        let shifted = UnionMap::of_vec(vec![AccessMap::new(s, "A", vec![s0.clone() + 1])]);

        let read_list = build_matcher_constraints(&read(&['i']), &reads);
        let write_list = build_matcher_constraints(&write(&['i']), &writes);
        let agreed = compare_lists(&read_list, &write_list);
        assert!(!agreed.is_empty());
        assert_eq!(agreed.get_dims_involved(), Some(1));
        assert_eq!(agreed.get('i'), Some(&s0));

        let shifted_list = build_matcher_constraints(&write(&['i']), &shifted);
        assert!(compare_lists(&read_list, &shifted_list).is_empty());
    }

    #[test]
    fn partial_agreement_test() {
        let s = s_ij();
        let i = AffineExpr::dim(s.clone(), 0);
        let j = AffineExpr::dim(s.clone(), 1);
        let reads = UnionMap::of_vec(vec![AccessMap::new(s.clone(), "A", vec![i.clone(), j.clone()])]);
        let writes = UnionMap::of_vec(vec![AccessMap::new(s, "A", vec![j.clone(), i.clone()])]);

        let read_list = build_matcher_constraints(&read(&['i', 'j']), &reads);
        let swapped = build_matcher_constraints(&write(&['j', 'i']), &writes);
        let agreed = compare_lists(&read_list, &swapped);
        assert_eq!(agreed.len(), 2);

        let other = build_matcher_constraints(&write(&['i', 'k']), &writes);
        assert!(compare_lists(&read_list, &other).is_empty());
        let same_order = build_matcher_constraints(&write(&['k', 'j']), &reads);
        let agreed = compare_lists(&read_list, &same_order);
        assert_eq!(agreed.get_constraints(), &[Constraint::new('j', j)]);
    }

    #[test]
    fn arity_mismatch_test() {
        let s = s_ij();
        let i = AffineExpr::dim(s.clone(), 0);
        let one = UnionMap::of_vec(vec![AccessMap::new(s.clone(), "A", vec![i.clone()])]);
        let two = UnionMap::of_vec(vec![AccessMap::new(s, "A", vec![i.clone(), i])]);

        let short = build_matcher_constraints(&read(&['i']), &one);
        let long = build_matcher_constraints(&write(&['i', 'j']), &two);
        assert!(!short.is_empty() && !long.is_empty());
        assert!(compare_lists(&short, &long).is_empty());
        assert!(compare_lists(&short, &ConstraintsList::empty()).is_empty());
    }
}
