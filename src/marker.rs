use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, repeat, separated};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// When a requirement applies, as far as ebuild generation cares.
///
/// Only two environment-marker shapes are understood: extra gates and
/// `python_version <` gates. Every other marker leaves the requirement
/// unconditional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Always required.
    Unconditional,
    /// `extra == '<feature>'`, possibly `and`-joined with other clauses.
    Extra(String),
    /// `python_version < "<version>"`.
    PythonBelow(String),
}

impl Condition {
    /// Classify the text after a requirement's `;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::Condition;
    ///
    /// assert_eq!(
    ///     Condition::classify(r#"python_version >= "3.8" and extra == 'plot'"#),
    ///     Condition::Extra("plot".to_string()),
    /// );
    /// assert_eq!(
    ///     Condition::classify(r#"python_version < "3.8""#),
    ///     Condition::PythonBelow("3.8".to_string()),
    /// );
    /// assert_eq!(
    ///     Condition::classify(r#"sys_platform == "win32""#),
    ///     Condition::Unconditional,
    /// );
    /// ```
    pub fn classify(marker: &str) -> Condition {
        let marker = marker.trim();

        // Extra gate: any `and`-joined clause may name the extra.
        let clauses = and_clauses.parse(marker).unwrap_or_else(|_| vec![marker]);
        for clause in clauses {
            if let Ok(feature) = extra_clause.parse(clause) {
                return Condition::Extra(feature.to_string());
            }
        }

        if let Ok(version) = python_below_clause.parse(marker) {
            return Condition::PythonBelow(version.to_string());
        }

        Condition::Unconditional
    }
}

// Winnow parsers

fn quoted<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    alt((
        delimited('\'', take_till(0.., '\''), '\''),
        delimited('"', take_till(0.., '"'), '"'),
    ))
    .parse_next(input)
}

/// `extra == '<feature>'`
fn extra_clause<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        multispace0,
        opt('('),
        multispace0,
        "extra",
        multispace0,
        "==",
        multispace0,
        quoted,
        multispace0,
        opt(')'),
        multispace0,
    )
        .map(|(_, _, _, _, _, _, _, feature, _, _, _)| feature.trim())
        .parse_next(input)
}

/// `python_version < "<version>"`
fn python_below_clause<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        multispace0,
        "python_version",
        multispace0,
        '<',
        multispace0,
        quoted,
        multispace0,
    )
        .map(|(_, _, _, _, _, version, _)| version.trim())
        .parse_next(input)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn word<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., is_word_char).parse_next(input)
}

/// A quoted string, a word other than `and`, or a single other character.
fn clause_token(input: &mut &str) -> ModalResult<()> {
    alt((
        quoted.void(),
        word.verify(|w: &str| w != "and").void(),
        one_of(|c: char| !is_word_char(c) && c != '\'' && c != '"').void(),
    ))
    .parse_next(input)
}

fn clause_text<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    repeat::<_, _, (), _, _>(1.., clause_token)
        .take()
        .parse_next(input)
}

/// The `and` keyword, with or without surrounding whitespace.
fn and_keyword(input: &mut &str) -> ModalResult<()> {
    (multispace0, word.verify(|w: &str| w == "and"), multispace0)
        .void()
        .parse_next(input)
}

/// A marker split into its top-level `and`-joined clauses.
fn and_clauses<'s>(input: &mut &'s str) -> ModalResult<Vec<&'s str>> {
    separated(1.., clause_text, and_keyword).parse_next(input)
}
