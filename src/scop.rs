//! ## Scop Loader
//! This module reads a small textual description of a static control part: a schedule tree in an
//! indentation based format followed by its read and write relations in isl-like notation.
//!
//! ```text
//! # comment
//! domain
//!   sequence
//!     filter S1
//!       leaf
//!     filter S2
//!       leaf
//! reads { S1[i, j] -> A[i, j]; S2[i, j] -> B[2i, j - 1] }
//! writes { S2[i, j] -> A[i, j] }
//! ```
//!
//! Every tree line is `<type> [annotation]`, indented by two spaces per level.

use std::{
    fs,
    iter::Peekable,
    path::{Path, PathBuf},
    rc::Rc,
    str::CharIndices,
};

use thiserror::Error;

use crate::{
    affine::{AffineExpr, Tuple},
    relation::{AccessMap, UnionMap},
    schedule_tree::{NodeId, ScheduleNodeType, ScheduleTree},
};

#[derive(Debug, Error)]
pub enum ScopError {
    #[error("unable to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: unknown node type `{name}`")]
    UnknownNodeType { line: usize, name: String },
    #[error("line {line}: indentation must be a multiple of two spaces")]
    OddIndentation { line: usize },
    #[error("line {line}: no parent node at this indentation")]
    MissingParent { line: usize },
    #[error("line {line}: a schedule tree has exactly one root")]
    MultipleRoots { line: usize },
    #[error("line {line}: {parent} node cannot take another child")]
    TooManyChildren {
        line: usize,
        parent: ScheduleNodeType,
    },
    #[error("line {line}: duplicate `{section}` section")]
    DuplicateSection { line: usize, section: String },
    #[error("line {line}, column {column}: {message}")]
    Relation {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("line {line}: dimension `{dim}` is not part of {tuple}")]
    UnknownDimension {
        line: usize,
        dim: String,
        tuple: String,
    },
    #[error("no schedule tree found")]
    MissingTree,
}

/// A schedule tree together with the access relations of its statements.
#[derive(Debug)]
pub struct Scop {
    pub schedule: ScheduleTree,
    pub reads: UnionMap,
    pub writes: UnionMap,
}

impl Scop {
    /// Load a scop description from `path`.
    pub fn from_file(path: &Path) -> Result<Self, ScopError> {
        log::info!("Opening {:?}", path);
        let text = fs::read_to_string(path).map_err(|source| ScopError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a scop description, see the module documentation for the format.
    pub fn parse(text: &str) -> Result<Self, ScopError> {
        let mut tree: Option<ScheduleTree> = None;
        // (depth, node) of the current path from the root
        let mut stack: Vec<(usize, NodeId)> = Vec::new();
        let mut reads: Option<UnionMap> = None;
        let mut writes: Option<UnionMap> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or("");
            if content.trim().is_empty() {
                continue;
            }

            let trimmed = content.trim_start();
            if let Some((section, slot)) = relation_section(trimmed, &mut reads, &mut writes) {
                if slot.is_some() {
                    return Err(ScopError::DuplicateSection {
                        line,
                        section: section.to_string(),
                    });
                }
                let offset = content.len() - trimmed.len() + section.len();
                let body = &content[offset..];
                *slot = Some(RelationParser::new(body, line, offset).parse_union()?);
                continue;
            }

            let indent = content.len() - trimmed.len();
            if indent % 2 != 0 {
                return Err(ScopError::OddIndentation { line });
            }
            let depth = indent / 2;
            let mut words = trimmed.trim_end().splitn(2, char::is_whitespace);
            let name = words.next().unwrap_or("");
            let node_type =
                ScheduleNodeType::from_name(name).ok_or_else(|| ScopError::UnknownNodeType {
                    line,
                    name: name.to_string(),
                })?;
            let annotation = words.next().map(str::trim).filter(|a| !a.is_empty());

            let tree = match tree.as_mut() {
                None => {
                    if depth != 0 {
                        return Err(ScopError::MissingParent { line });
                    }
                    let new_tree = match annotation {
                        Some(annotation) => ScheduleTree::with_annotation(node_type, annotation),
                        None => ScheduleTree::new(node_type),
                    };
                    stack.push((0, new_tree.root_id()));
                    tree = Some(new_tree);
                    continue;
                }
                Some(tree) => tree,
            };
            if depth == 0 {
                return Err(ScopError::MultipleRoots { line });
            }

            while stack.last().is_some_and(|(d, _)| *d >= depth) {
                stack.pop();
            }
            let parent = match stack.last() {
                Some((d, parent)) if *d + 1 == depth => *parent,
                _ => return Err(ScopError::MissingParent { line }),
            };
            let parent_node = tree.node(parent);
            let parent_type = parent_node.node_type();
            let full = match parent_type {
                ScheduleNodeType::Leaf => true,
                ty => !ty.is_variadic() && parent_node.n_children() > 0,
            };
            if full {
                return Err(ScopError::TooManyChildren {
                    line,
                    parent: parent_type,
                });
            }

            let id = match annotation {
                Some(annotation) => tree.add_annotated_child(parent, node_type, annotation),
                None => tree.add_child(parent, node_type),
            };
            stack.push((depth, id));
        }

        let schedule = tree.ok_or(ScopError::MissingTree)?;
        Ok(Self {
            schedule,
            reads: reads.unwrap_or_default(),
            writes: writes.unwrap_or_default(),
        })
    }
}

/// Check whether `line` starts a `reads` or `writes` section and return the slot it fills.
fn relation_section<'a>(
    line: &str,
    reads: &'a mut Option<UnionMap>,
    writes: &'a mut Option<UnionMap>,
) -> Option<(&'static str, &'a mut Option<UnionMap>)> {
    let starts_section = |keyword: &str| {
        line.strip_prefix(keyword)
            .is_some_and(|rest| rest.trim_start().starts_with('{'))
    };
    if starts_section("reads") {
        Some(("reads", reads))
    } else if starts_section("writes") {
        Some(("writes", writes))
    } else {
        None
    }
}

/// Recursive descent parser for union maps such as `{ S[i] -> A[i + 1]; S[i] -> B[2i] }`.
struct RelationParser<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
    line: usize,
    offset: usize,
}

impl<'a> RelationParser<'a> {
    fn new(text: &'a str, line: usize, offset: usize) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            len: text.len(),
            line,
            offset,
        }
    }

    fn error(&mut self, message: impl Into<String>) -> ScopError {
        let pos = self.chars.peek().map(|(pos, _)| *pos).unwrap_or(self.len);
        ScopError::Relation {
            line: self.line,
            column: self.offset + pos + 1,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().map(|(_, c)| *c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ScopError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", expected)))
        }
    }

    fn ident(&mut self) -> Result<String, ScopError> {
        self.skip_whitespace();
        let mut acc = String::new();
        if let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_alphabetic() || *c == '_') {
            acc.push(c);
        } else {
            return Err(self.error("expected an identifier"));
        }
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_alphanumeric() || *c == '_') {
            acc.push(c);
        }
        Ok(acc)
    }

    fn integer(&mut self) -> Result<Option<i64>, ScopError> {
        self.skip_whitespace();
        let mut acc: Option<i64> = None;
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit()) {
            let digit = i64::from(c.to_digit(10).unwrap_or(0));
            let value = acc
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| self.error("integer out of range"))?;
            acc = Some(value);
        }
        Ok(acc)
    }

    fn parse_union(mut self) -> Result<UnionMap, ScopError> {
        self.expect('{')?;
        let mut union = UnionMap::new();
        if self.eat('}') {
            return Ok(union);
        }
        loop {
            union.insert(self.parse_map()?);
            if self.eat(';') {
                continue;
            }
            self.expect('}')?;
            break;
        }
        if self.peek().is_some() {
            return Err(self.error("trailing input after relation"));
        }
        Ok(union)
    }

    fn parse_map(&mut self) -> Result<AccessMap, ScopError> {
        let name = self.ident()?;
        self.expect('[')?;
        let mut dims = Vec::new();
        if !self.eat(']') {
            loop {
                dims.push(self.ident()?);
                if self.eat(']') {
                    break;
                }
                self.expect(',')?;
            }
        }
        let domain = Rc::new(Tuple::new(name, dims));

        self.expect('-')?;
        self.expect('>')?;
        let range_name = self.ident()?;
        self.expect('[')?;
        let mut outputs = Vec::new();
        if !self.eat(']') {
            loop {
                outputs.push(self.parse_expr(&domain)?);
                if self.eat(']') {
                    break;
                }
                self.expect(',')?;
            }
        }
        Ok(AccessMap::new(domain, range_name, outputs))
    }

    fn parse_expr(&mut self, domain: &Rc<Tuple>) -> Result<AffineExpr, ScopError> {
        let mut expr = AffineExpr::constant(domain.clone(), 0);
        let mut sign = if self.eat('-') { -1 } else { 1 };
        loop {
            let term = self.parse_term(domain)?;
            expr = term
                .checked_mul(sign)
                .and_then(|term| expr.checked_add(&term))
                .ok_or_else(|| self.error("integer out of range"))?;
            sign = if self.eat('+') {
                1
            } else if self.eat('-') {
                -1
            } else {
                break;
            };
        }
        Ok(expr)
    }

    /// A term is `n`, `d`, `nd` or `n*d` for an integer `n` and a dimension `d`.
    fn parse_term(&mut self, domain: &Rc<Tuple>) -> Result<AffineExpr, ScopError> {
        let factor = self.integer()?;
        let has_dim = match factor {
            Some(_) => {
                self.eat('*');
                self.peek().is_some_and(|c| c.is_alphabetic() || c == '_')
            }
            None => true,
        };
        if !has_dim {
            return Ok(AffineExpr::constant(domain.clone(), factor.unwrap_or(0)));
        }

        let dim = self.ident()?;
        let pos = domain
            .position(&dim)
            .ok_or_else(|| ScopError::UnknownDimension {
                line: self.line,
                dim,
                tuple: domain.to_string(),
            })?;
        Ok(AffineExpr::dim(domain.clone(), pos) * factor.unwrap_or(1))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        node_matcher::{ScheduleNodeMatcher, domain, filter, leaf, mark, sequence},
        pretty_print::pretty_print,
        schedule_tree::ScheduleNodeType,
    };

    use super::{Scop, ScopError};

    const EXAMPLE: &str = "\
# two statements sharing A
domain
  sequence
    filter S1
      leaf
    filter S2
      mark kernel
        leaf
reads { S1[i, j] -> A[i, j]; S2[i, j] -> B[2i, j - 1] }
writes { S2[i, j] -> A[i, 3*j + 1] }
";

    #[test]
    fn parse_test() {
        let scop = Scop::parse(EXAMPLE).unwrap();
        let root = scop.schedule.root();
        assert_eq!(root.node_type(), ScheduleNodeType::Domain);
        assert_eq!(scop.schedule.len(), 7);
        assert_eq!(root.child(0).child(1).child(0).annotation(), Some("kernel"));
        assert!(ScheduleNodeMatcher::is_matching(
            &domain(sequence(vec![filter(leaf()), filter(mark(leaf()))])),
            root
        ));

        assert_eq!(scop.reads.len(), 2);
        assert_eq!(
            scop.reads.to_string(),
            "{ S1[i, j] -> A[i, j]; S2[i, j] -> B[2i, j - 1] }"
        );
        assert_eq!(scop.writes.to_string(), "{ S2[i, j] -> A[i, 3j + 1] }");
    }

    #[test]
    fn tree_round_trip_test() {
        let scop = Scop::parse(EXAMPLE).unwrap();
        let dump = pretty_print(&scop.schedule.root());
        let reparsed = Scop::parse(&dump).unwrap();
        assert_eq!(pretty_print(&reparsed.schedule.root()), dump);
        assert!(reparsed.reads.is_empty() && reparsed.writes.is_empty());
    }

    #[test]
    fn expression_forms_test() {
        let scop = Scop::parse("leaf\nreads { S[i, j] -> A[-i + 2, 2 * j - i, 0] }\n").unwrap();
        assert_eq!(
            scop.reads.to_string(),
            "{ S[i, j] -> A[-i + 2, -i + 2j, 0] }"
        );
        let scalar = Scop::parse("leaf\nwrites { S[] -> x[] }").unwrap();
        assert_eq!(scalar.writes.iter().next().map(|m| m.arity()), Some(0));
    }

    #[test]
    fn errors_test() {
        assert!(matches!(
            Scop::parse("domain\n   leaf"),
            Err(ScopError::OddIndentation { line: 2 })
        ));
        assert!(matches!(
            Scop::parse("domain\n  loop"),
            Err(ScopError::UnknownNodeType { line: 2, .. })
        ));
        assert!(matches!(
            Scop::parse("domain\n  leaf\n  leaf"),
            Err(ScopError::TooManyChildren { line: 3, .. })
        ));
        assert!(matches!(
            Scop::parse("domain\nleaf"),
            Err(ScopError::MultipleRoots { line: 2 })
        ));
        assert!(matches!(
            Scop::parse("domain\n    leaf"),
            Err(ScopError::MissingParent { line: 2 })
        ));
        assert!(matches!(Scop::parse("# nothing"), Err(ScopError::MissingTree)));
        assert!(matches!(
            Scop::parse("leaf\nreads { S[i] -> A[k] }"),
            Err(ScopError::UnknownDimension { line: 2, .. })
        ));
        assert!(matches!(
            Scop::parse("leaf\nreads { S[i] -> A[i }"),
            Err(ScopError::Relation { line: 2, .. })
        ));
        assert!(matches!(
            Scop::parse("leaf\nreads { }\nreads { }"),
            Err(ScopError::DuplicateSection { line: 3, .. })
        ));
    }

    #[test]
    fn integer_range_test() {
        let out_of_range = |text: &str| {
            matches!(
                Scop::parse(text),
                Err(ScopError::Relation { line: 2, ref message, .. }) if message == "integer out of range"
            )
        };
        assert!(out_of_range("leaf\nreads { S[i] -> A[99999999999999999999] }\n"));
        assert!(out_of_range("leaf\nreads { S[i] -> A[9223372036854775807 + 1] }"));
        assert!(out_of_range("leaf\nreads { S[i] -> A[9223372036854775807i + i] }"));
        assert!(out_of_range("leaf\nreads { S[i] -> A[-9223372036854775807 - 2] }"));

        let scop = Scop::parse("leaf\nreads { S[i] -> A[-9223372036854775807 - 1] }").unwrap();
        assert_eq!(
            scop.reads.to_string(),
            "{ S[i] -> A[-9223372036854775808] }"
        );
    }

    #[test]
    fn error_column_test() {
        // missing `}` is reported just past the end of the line
        assert!(matches!(
            Scop::parse("leaf\nreads { S[i] -> A[i]"),
            Err(ScopError::Relation { line: 2, column: 21, .. })
        ));
        assert!(matches!(
            Scop::parse("leaf\n  reads { S[i] -> A[i] "),
            Err(ScopError::Relation { line: 2, column: 24, .. })
        ));
        assert!(matches!(
            Scop::parse("leaf\nreads { S[i] -> A[i }"),
            Err(ScopError::Relation { line: 2, column: 21, .. })
        ));
    }
}
