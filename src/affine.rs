//! ## Affine Expressions
//! This module contains a small quasi-isl representation of affine expressions over the instances
//! of a statement. The key exported data structures are:
//! - [Tuple] for named tuples such as `S[i, j]`
//! - [AffineExpr] for a single scalar affine function of a [Tuple], such as `{ S[i, j] -> [(i + 1)] }`
//!
//! Expressions are only ever compared structurally, two expressions are equal if and only if they
//! are defined over the same tuple and have the same coefficients.

use std::{
    fmt,
    ops::{Add, Mul, Neg, Sub},
    rc::Rc,
};

/// A named tuple of dimensions, e.g. the iteration domain `S[i, j]` of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    name: String,
    dims: Vec<String>,
}

impl Tuple {
    pub fn new(name: impl Into<String>, dims: Vec<String>) -> Self {
        Self {
            name: name.into(),
            dims,
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_dims(&self) -> &[String] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Obtain the index of the dimension called `dim` if it exists.
    pub fn position(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.dims.join(", "))
    }
}

/// An affine function `c_0 * d_0 + ... + c_n * d_n + constant` of the dimensions `d_i` of its
/// domain [Tuple].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffineExpr {
    domain: Rc<Tuple>,
    coefficients: Vec<i64>,
    constant: i64,
}

impl AffineExpr {
    /// Create a new expression, `coefficients` must contain one entry per dimension of `domain`.
    pub fn new(domain: Rc<Tuple>, coefficients: Vec<i64>, constant: i64) -> Self {
        assert_eq!(
            domain.len(),
            coefficients.len(),
            "Coefficient count does not match the dimensions of {}",
            domain
        );
        Self {
            domain,
            coefficients,
            constant,
        }
    }

    /// Create the constant expression `value` over `domain`.
    pub fn constant(domain: Rc<Tuple>, value: i64) -> Self {
        let coefficients = vec![0; domain.len()];
        Self::new(domain, coefficients, value)
    }

    /// Create the expression selecting the `pos`-th dimension of `domain`.
    pub fn dim(domain: Rc<Tuple>, pos: usize) -> Self {
        assert!(pos < domain.len(), "Dimension {} out of range for {}", pos, domain);
        let mut coefficients = vec![0; domain.len()];
        coefficients[pos] = 1;
        Self::new(domain, coefficients, 0)
    }

    pub fn get_domain(&self) -> &Rc<Tuple> {
        &self.domain
    }

    pub fn get_coefficient(&self, pos: usize) -> i64 {
        self.coefficients[pos]
    }

    pub fn get_constant(&self) -> i64 {
        self.constant
    }

    /// Check whether the expression does not depend on any dimension of its domain.
    pub fn is_constant(&self) -> bool {
        self.coefficients.iter().all(|c| *c == 0)
    }

    /// Evaluate the expression at the integer point `point` of its domain.
    pub fn eval(&self, point: &[i64]) -> i64 {
        assert_eq!(point.len(), self.coefficients.len());
        self.coefficients
            .iter()
            .zip(point)
            .fold(self.constant, |acc, (c, x)| acc + c * x)
    }

    /// Render only the affine form, without the surrounding domain, e.g. `2i - j + 1`.
    pub fn linear_form(&self) -> String {
        let mut acc = String::new();
        for (coeff, name) in self.coefficients.iter().zip(self.domain.get_dims()) {
            if *coeff == 0 {
                continue;
            }
            push_sign(&mut acc, *coeff);
            match coeff.unsigned_abs() {
                1 => acc.push_str(name),
                abs => {
                    acc.push_str(&abs.to_string());
                    acc.push_str(name);
                }
            }
        }
        if self.constant != 0 || acc.is_empty() {
            push_sign(&mut acc, self.constant);
            acc.push_str(&self.constant.unsigned_abs().to_string());
        }
        acc
    }

    /// Like `self + other`, but `None` if a coefficient or the constant overflows.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        assert_eq!(
            self.domain, other.domain,
            "Combining affine expressions over different domains"
        );
        let coefficients = self
            .coefficients
            .iter()
            .zip(&other.coefficients)
            .map(|(a, b)| a.checked_add(*b))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            domain: self.domain.clone(),
            coefficients,
            constant: self.constant.checked_add(other.constant)?,
        })
    }

    /// Like `self * factor`, but `None` if a coefficient or the constant overflows.
    pub fn checked_mul(&self, factor: i64) -> Option<Self> {
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| c.checked_mul(factor))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            domain: self.domain.clone(),
            coefficients,
            constant: self.constant.checked_mul(factor)?,
        })
    }

    fn combine(self, other: &Self, sign: i64) -> Self {
        assert_eq!(
            self.domain, other.domain,
            "Combining affine expressions over different domains"
        );
        let coefficients = self
            .coefficients
            .iter()
            .zip(&other.coefficients)
            .map(|(a, b)| a + sign * b)
            .collect();
        Self {
            domain: self.domain,
            coefficients,
            constant: self.constant + sign * other.constant,
        }
    }
}

fn push_sign(acc: &mut String, value: i64) {
    match (acc.is_empty(), value < 0) {
        (true, true) => acc.push('-'),
        (true, false) => {}
        (false, true) => acc.push_str(" - "),
        (false, false) => acc.push_str(" + "),
    }
}

impl Add for AffineExpr {
    type Output = AffineExpr;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(&rhs, 1)
    }
}

impl Sub for AffineExpr {
    type Output = AffineExpr;

    fn sub(self, rhs: Self) -> Self::Output {
        self.combine(&rhs, -1)
    }
}

impl Add<i64> for AffineExpr {
    type Output = AffineExpr;

    fn add(mut self, rhs: i64) -> Self::Output {
        self.constant += rhs;
        self
    }
}

impl Mul<i64> for AffineExpr {
    type Output = AffineExpr;

    fn mul(mut self, rhs: i64) -> Self::Output {
        self.coefficients.iter_mut().for_each(|c| *c *= rhs);
        self.constant *= rhs;
        self
    }
}

impl Neg for AffineExpr {
    type Output = AffineExpr;

    fn neg(self) -> Self::Output {
        self * -1
    }
}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ {} -> [({})] }}", self.domain, self.linear_form())
    }
}
