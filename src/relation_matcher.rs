//! ## Relation Matchers
//! This module contains [RelationMatcher], a declarative description of the shape of an access
//! relation. A matcher consists of an access kind and a layout of one character labels, one per
//! output dimension of the access, e.g. `read(&['i', 'j'])` describes a two dimensional read.
//! Using the same label in several positions, or in several matchers that are compared against
//! each other, requires the corresponding dimensions to be bound to the same [AffineExpr].

use std::fmt;

use crate::{
    affine::AffineExpr,
    constraints::Constraint,
    relation::{AccessMap, UnionMap},
};

/// The kind of access a [RelationMatcher] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Read,
    Write,
    ReadAndWrite,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RelationKind::Read => write!(f, "read"),
            RelationKind::Write => write!(f, "write"),
            RelationKind::ReadAndWrite => write!(f, "read & write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMatcher {
    kind: RelationKind,
    /// The layout of the output dimensions.
    indexes: Vec<char>,
    /// One entry per access the matcher has been resolved against, each holding one expression
    /// per label.
    set_dim: Vec<Vec<AffineExpr>>,
    is_set_dim: bool,
}

/// Describe a read access with the output dimension layout `labels`.
pub fn read(labels: &[char]) -> RelationMatcher {
    RelationMatcher::new(RelationKind::Read, labels)
}

/// Describe a write access with the output dimension layout `labels`.
pub fn write(labels: &[char]) -> RelationMatcher {
    RelationMatcher::new(RelationKind::Write, labels)
}

/// Describe an access that has to be matched against both reads and writes.
pub fn read_and_write(labels: &[char]) -> RelationMatcher {
    RelationMatcher::new(RelationKind::ReadAndWrite, labels)
}

impl RelationMatcher {
    fn new(kind: RelationKind, labels: &[char]) -> Self {
        Self {
            kind,
            indexes: labels.to_vec(),
            set_dim: Vec::new(),
            is_set_dim: false,
        }
    }

    /// Check whether the matcher applies to reads, this includes [RelationKind::ReadAndWrite].
    pub fn is_read(&self) -> bool {
        matches!(self.kind, RelationKind::Read | RelationKind::ReadAndWrite)
    }

    /// Check whether the matcher applies to writes, this includes [RelationKind::ReadAndWrite].
    pub fn is_write(&self) -> bool {
        matches!(self.kind, RelationKind::Write | RelationKind::ReadAndWrite)
    }

    pub fn get_kind(&self) -> RelationKind {
        self.kind
    }

    /// Obtain the label at position `idx`.
    pub fn get_label(&self, idx: usize) -> char {
        self.indexes[idx]
    }

    pub fn get_labels(&self) -> &[char] {
        &self.indexes
    }

    pub fn num_labels(&self) -> usize {
        self.indexes.len()
    }

    /// Check whether `self` and `other` have at least one label in common.
    pub fn shares_label(&self, other: &RelationMatcher) -> bool {
        self.indexes.iter().any(|label| other.indexes.contains(label))
    }

    /// Record one resolved binding, `constraints` has to follow the label layout of the matcher.
    pub fn set_dims(&mut self, constraints: &[Constraint]) {
        assert_eq!(
            constraints.len(),
            self.indexes.len(),
            "Binding does not cover the labels of the matcher"
        );
        debug_assert!(
            constraints
                .iter()
                .zip(&self.indexes)
                .all(|(c, label)| c.get_label() == *label)
        );
        self.set_dim
            .push(constraints.iter().map(|c| c.get_expr().clone()).collect());
    }

    /// Obtain the expressions bound to the label at position `idx`, one per recorded binding.
    pub fn get_dims(&self, idx: usize) -> Vec<AffineExpr> {
        self.set_dim
            .iter()
            .map(|binding| binding[idx].clone())
            .collect()
    }

    /// All recorded bindings, in the order they were set.
    pub fn get_bindings(&self) -> &[Vec<AffineExpr>] {
        &self.set_dim
    }

    /// Obtain the individual maps of `accesses` that have as many output dimensions as the matcher
    /// has labels.
    pub fn get_accesses<'a>(&self, accesses: &'a UnionMap) -> Vec<&'a AccessMap> {
        accesses.filter_arity(self.indexes.len()).collect()
    }

    pub fn is_set(&self) -> bool {
        self.is_set_dim
    }

    pub fn set(&mut self) {
        self.is_set_dim = true;
    }
}
