//! # Polymatch
//! This library contains structural matchers for polyhedral schedule trees and access relations.
//! [node_matcher] describes the shape of schedule trees, optionally guarded by the sibling and
//! descendant predicates from [predicates]. [relation_matcher] describes the shape of memory
//! accesses, [constraints] binds such descriptions to concrete accesses and [finder] uses the
//! bindings to report read and write accesses that bind at least one shared label to the same
//! expression. Additionally [scop]
//! is able to read a small textual description of a schedule tree and its accesses.

pub mod affine;
pub mod constraints;
pub mod finder;
pub mod node_matcher;
pub mod predicates;
pub mod pretty_print;
pub mod relation;
pub mod relation_matcher;
pub mod schedule_tree;
pub mod scop;
