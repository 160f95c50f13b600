use std::fmt;

use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::error::{Error, Result};
use crate::marker::Condition;

/// Comparison kept from a requirement's version specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionOp {
    /// `>=` (or `~=`, which implies it).
    Minimum,
    /// `==` (or `===`).
    Exact,
}

/// A version constraint; the version string is carried as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
    /// Comparison operator.
    pub op: VersionOp,
    /// Version exactly as written in the specifier.
    pub version: String,
}

impl VersionConstraint {
    /// `>= version`
    pub fn minimum(version: impl Into<String>) -> Self {
        VersionConstraint {
            op: VersionOp::Minimum,
            version: version.into(),
        }
    }

    /// `== version`
    pub fn exact(version: impl Into<String>) -> Self {
        VersionConstraint {
            op: VersionOp::Exact,
            version: version.into(),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.op {
            VersionOp::Minimum => write!(f, ">={}", self.version),
            VersionOp::Exact => write!(f, "=={}", self.version),
        }
    }
}

/// One `requires_dist` entry, reduced to what an ebuild needs.
///
/// The accepted grammar, in order of precedence:
///
/// 1. everything after the first `;` is an environment marker, classified by
///    [`Condition::classify`];
/// 2. the name is a run of `[A-Za-z0-9._-]` starting with an alphanumeric;
///    a `[extras]` qualifier after it is dropped;
/// 3. the specifier, bare or in parentheses, is a comma-separated clause
///    list. The first `>=`/`~=` clause gives a minimum, otherwise the first
///    `==` clause gives an exact version, otherwise there is no constraint.
///    A remainder that is not a clause list (a direct URL reference, say)
///    leaves the requirement unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    /// Package name as written on the registry.
    pub name: String,
    /// Version constraint, if one was recognised.
    pub constraint: Option<VersionConstraint>,
    /// Marker classification.
    pub condition: Condition,
}

impl Requirement {
    /// Parse a raw `requires_dist` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::{Condition, Requirement, VersionConstraint};
    ///
    /// let req = Requirement::parse("urllib3 (>=1.21.1)").unwrap();
    /// assert_eq!(req.name, "urllib3");
    /// assert_eq!(req.constraint, Some(VersionConstraint::minimum("1.21.1")));
    ///
    /// let req = Requirement::parse("PySocks!=1.5.7,>=1.5.6; extra == 'socks'").unwrap();
    /// assert_eq!(req.name, "PySocks");
    /// assert_eq!(req.condition, Condition::Extra("socks".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Result<Requirement> {
        let (spec, marker) = match raw.split_once(';') {
            Some((spec, marker)) => (spec, Some(marker)),
            None => (raw, None),
        };

        let condition = marker.map_or(Condition::Unconditional, Condition::classify);

        let mut input = spec.trim();
        let name = name_with_extras
            .parse_next(&mut input)
            .map_err(|_| Error::InvalidRequirement(raw.to_string()))?;

        let constraint = match specifier.parse(input) {
            Ok(clauses) => select_constraint(clauses),
            Err(_) => {
                tracing::debug!("ignoring unrecognised specifier {input:?} in {raw:?}");
                None
            }
        };

        Ok(Requirement {
            name: name.to_string(),
            constraint,
            condition,
        })
    }
}

/// Operator of a single specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseOp {
    Arbitrary,
    Equal,
    Compatible,
    GreaterEqual,
    LessEqual,
    NotEqual,
    Greater,
    Less,
}

fn select_constraint(clauses: Vec<(ClauseOp, &str)>) -> Option<VersionConstraint> {
    let minimum = clauses
        .iter()
        .find(|(op, _)| matches!(op, ClauseOp::GreaterEqual | ClauseOp::Compatible))
        .map(|(_, v)| VersionConstraint::minimum(*v));

    minimum.or_else(|| {
        clauses
            .iter()
            .find(|(op, _)| matches!(op, ClauseOp::Equal | ClauseOp::Arbitrary))
            .map(|(_, v)| VersionConstraint::exact(*v))
    })
}

// Winnow parsers

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

fn is_version_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ',' | '(' | ')' | ';')
}

fn name_with_extras<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    let name = take_while(1.., is_name_char)
        .verify(|name: &str| name.starts_with(|c: char| c.is_ascii_alphanumeric()))
        .parse_next(input)?;
    opt(preceded(
        multispace0,
        delimited('[', take_till(0.., ']'), ']'),
    ))
    .parse_next(input)?;
    Ok(name)
}

fn clause_op(input: &mut &str) -> ModalResult<ClauseOp> {
    alt((
        "===".value(ClauseOp::Arbitrary),
        "==".value(ClauseOp::Equal),
        "~=".value(ClauseOp::Compatible),
        ">=".value(ClauseOp::GreaterEqual),
        "<=".value(ClauseOp::LessEqual),
        "!=".value(ClauseOp::NotEqual),
        ">".value(ClauseOp::Greater),
        "<".value(ClauseOp::Less),
    ))
    .parse_next(input)
}

fn clause<'s>(input: &mut &'s str) -> ModalResult<(ClauseOp, &'s str)> {
    (
        multispace0,
        clause_op,
        multispace0,
        take_while(1.., is_version_char),
    )
        .map(|(_, op, _, version)| (op, version))
        .parse_next(input)
}

fn clause_list<'s>(input: &mut &'s str) -> ModalResult<Vec<(ClauseOp, &'s str)>> {
    separated(0.., clause, (multispace0, ',')).parse_next(input)
}

fn specifier<'s>(input: &mut &'s str) -> ModalResult<Vec<(ClauseOp, &'s str)>> {
    (
        multispace0,
        alt((
            delimited('(', clause_list, (multispace0, ')')),
            clause_list,
        )),
        multispace0,
    )
        .map(|(_, clauses, _)| clauses)
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parenthesised_minimum() {
        let req = Requirement::parse("bar (>=1.0)").unwrap();
        assert_eq!(req.name, "bar");
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("1.0")));
        assert_eq!(req.condition, Condition::Unconditional);
    }

    #[test]
    fn bare_minimum() {
        let req = Requirement::parse("bar >=1.0").unwrap();
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("1.0")));

        let req = Requirement::parse("bar>=2.3.1").unwrap();
        assert_eq!(req.name, "bar");
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("2.3.1")));
    }

    #[test]
    fn parenthesised_exact() {
        let req = Requirement::parse("name (==4.2)").unwrap();
        assert_eq!(req.constraint, Some(VersionConstraint::exact("4.2")));
    }

    #[test]
    fn minimum_wins_over_exact_and_upper_bounds() {
        let req = Requirement::parse("idna<4,>=2.5").unwrap();
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("2.5")));

        let req = Requirement::parse("six (==1.16.0,>=1.10)").unwrap();
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("1.10")));
    }

    #[test]
    fn compatible_release_is_a_minimum() {
        let req = Requirement::parse("attrs~=23.1").unwrap();
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("23.1")));
    }

    #[test]
    fn upper_bound_only_is_unconstrained() {
        let req = Requirement::parse("chardet (<6,!=5.0)").unwrap();
        assert_eq!(req.name, "chardet");
        assert_eq!(req.constraint, None);
    }

    #[test]
    fn extras_qualifier_is_dropped() {
        let req = Requirement::parse("requests[socks,security] (>=2.0)").unwrap();
        assert_eq!(req.name, "requests");
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("2.0")));
    }

    #[test]
    fn extra_gated_without_constraint() {
        let req = Requirement::parse("name ; extra == 'plot'").unwrap();
        assert_eq!(req.name, "name");
        assert_eq!(req.constraint, None);
        assert_eq!(req.condition, Condition::Extra("plot".to_string()));
    }

    #[test]
    fn python_gated_with_constraint() {
        let req =
            Requirement::parse(r#"importlib-metadata>=3.6; python_version < "3.10""#).unwrap();
        assert_eq!(req.name, "importlib-metadata");
        assert_eq!(req.constraint, Some(VersionConstraint::minimum("3.6")));
        assert_eq!(req.condition, Condition::PythonBelow("3.10".to_string()));
    }

    #[test]
    fn wildcard_exact_kept_verbatim() {
        let req = Requirement::parse("numpy==1.*").unwrap();
        assert_eq!(req.constraint, Some(VersionConstraint::exact("1.*")));
    }

    #[test]
    fn direct_reference_is_bare_name() {
        let req =
            Requirement::parse("pip @ https://github.com/pypa/pip/archive/1.3.1.zip").unwrap();
        assert_eq!(req.name, "pip");
        assert_eq!(req.constraint, None);
    }

    #[test]
    fn dotted_and_mixed_case_names() {
        let req = Requirement::parse("zope.interface>=5").unwrap();
        assert_eq!(req.name, "zope.interface");
        let req = Requirement::parse("Jinja2").unwrap();
        assert_eq!(req.name, "Jinja2");
    }

    #[test]
    fn invalid_requirements() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("   ").is_err());
        assert!(Requirement::parse(">=1.0").is_err());
        assert!(Requirement::parse("-foo").is_err());
    }

    #[test]
    fn constraint_display() {
        assert_eq!(VersionConstraint::minimum("1.0").to_string(), ">=1.0");
        assert_eq!(VersionConstraint::exact("2").to_string(), "==2");
    }
}
