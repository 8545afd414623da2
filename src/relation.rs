//! ## Access Relations
//! This module contains the representation of memory access relations. The key exported data
//! structures are:
//! - [AccessMap] for a single map from statement instances to array elements
//! - [UnionMap] for a union of such maps, e.g. all reads of a program

use std::{fmt, rc::Rc, slice};

use crate::affine::{AffineExpr, Tuple};

/// A single access map `{ S[i, j] -> A[e_0, ..., e_n] }` where every output dimension `e_k` is an
/// [AffineExpr] over the statement tuple `S[i, j]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessMap {
    domain: Rc<Tuple>,
    range_name: String,
    outputs: Vec<AffineExpr>,
}

impl AccessMap {
    pub fn new(domain: Rc<Tuple>, range_name: impl Into<String>, outputs: Vec<AffineExpr>) -> Self {
        assert!(
            outputs.iter().all(|out| *out.get_domain() == domain),
            "Output expression not defined over {}",
            domain
        );
        Self {
            domain,
            range_name: range_name.into(),
            outputs,
        }
    }

    pub fn get_domain(&self) -> &Rc<Tuple> {
        &self.domain
    }

    pub fn get_range_name(&self) -> &str {
        &self.range_name
    }

    /// The number of output dimensions.
    pub fn arity(&self) -> usize {
        self.outputs.len()
    }

    /// Obtain the scalar expression of the `pos`-th output dimension.
    pub fn get_dim_expr(&self, pos: usize) -> &AffineExpr {
        &self.outputs[pos]
    }

    pub fn iter_dims(&self) -> slice::Iter<'_, AffineExpr> {
        self.outputs.iter()
    }

    fn fmt_body(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}[", self.domain, self.range_name)?;
        for (idx, out) in self.outputs.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", out.linear_form())?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for AccessMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ ")?;
        self.fmt_body(f)?;
        write!(f, " }}")
    }
}

/// A union of [AccessMap], kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionMap {
    maps: Vec<AccessMap>,
}

impl UnionMap {
    pub fn new() -> Self {
        Self { maps: Vec::new() }
    }

    pub fn of_vec(maps: Vec<AccessMap>) -> Self {
        Self { maps }
    }

    pub fn insert(&mut self, map: AccessMap) {
        self.maps.push(map);
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, AccessMap> {
        self.maps.iter()
    }

    /// Iterate over the individual maps with exactly `arity` output dimensions.
    pub fn filter_arity(&self, arity: usize) -> impl Iterator<Item = &AccessMap> {
        self.maps.iter().filter(move |map| map.arity() == arity)
    }
}

impl FromIterator<AccessMap> for UnionMap {
    fn from_iter<I: IntoIterator<Item = AccessMap>>(iter: I) -> Self {
        Self {
            maps: FromIterator::from_iter(iter),
        }
    }
}

impl<'a> IntoIterator for &'a UnionMap {
    type Item = &'a AccessMap;

    type IntoIter = slice::Iter<'a, AccessMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.iter()
    }
}

impl fmt::Display for UnionMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.maps.is_empty() {
            return write!(f, "{{  }}");
        }
        write!(f, "{{ ")?;
        for (idx, map) in self.maps.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            map.fmt_body(f)?;
        }
        write!(f, " }}")
    }
}
