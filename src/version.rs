use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, preceded, separated};
use winnow::prelude::*;
use winnow::token::{one_of, rest};

use crate::error::{Error, Result};

/// Translate a PEP 440 version into Gentoo version syntax.
///
/// | PEP 440            | Gentoo          |
/// |--------------------|-----------------|
/// | `1.2.3`            | `1.2.3`         |
/// | `2.0a1`, `2.0.b2`  | `2.0_alpha1`, `2.0_beta2` |
/// | `2.0rc1`, `2.0c1`  | `2.0_rc1`       |
/// | `1.0.post3`, `1.0-3` | `1.0_p3`      |
/// | `1.0.dev4`         | `1.0_pre4`      |
///
/// Epochs and local version labels have no Gentoo counterpart and are
/// dropped.
///
/// See [PMS 3.2](https://projects.gentoo.org/pms/9/pms.html#version-specifications).
///
/// # Examples
///
/// ```
/// use pypi_ebuild::version::to_gentoo;
///
/// assert_eq!(to_gentoo("2.32.0").unwrap(), "2.32.0");
/// assert_eq!(to_gentoo("3.0.0rc2").unwrap(), "3.0.0_rc2");
/// assert!(to_gentoo("latest").is_err());
/// ```
pub fn to_gentoo(version: &str) -> Result<String> {
    let lowered = version.trim().to_ascii_lowercase();
    pep440
        .parse(lowered.as_str())
        .map_err(|_| Error::InvalidVersion(version.to_string()))
}

/// Like [`to_gentoo`], but keeps the input when it cannot be translated.
pub fn to_gentoo_lossy(version: &str) -> String {
    to_gentoo(version).unwrap_or_else(|err| {
        tracing::warn!("{err}, keeping it as written");
        version.to_string()
    })
}

// Winnow parsers

fn separator(input: &mut &str) -> ModalResult<()> {
    opt(one_of(['.', '-', '_'])).void().parse_next(input)
}

fn release<'s>(input: &mut &'s str) -> ModalResult<Vec<&'s str>> {
    separated(1.., digit1, '.').parse_next(input)
}

fn pre_release<'s>(input: &mut &'s str) -> ModalResult<(&'static str, Option<&'s str>)> {
    (
        separator,
        alt((
            "alpha".value("alpha"),
            "a".value("alpha"),
            "beta".value("beta"),
            "b".value("beta"),
            "preview".value("rc"),
            "pre".value("rc"),
            "rc".value("rc"),
            "c".value("rc"),
        )),
        separator,
        opt(digit1),
    )
        .map(|(_, kind, _, number)| (kind, number))
        .parse_next(input)
}

fn post_release<'s>(input: &mut &'s str) -> ModalResult<Option<&'s str>> {
    alt((
        (separator, alt(("post", "rev", "r")), separator, opt(digit1))
            .map(|(_, _, _, number)| number),
        preceded('-', digit1).map(Some),
    ))
    .parse_next(input)
}

fn dev_release<'s>(input: &mut &'s str) -> ModalResult<Option<&'s str>> {
    (separator, "dev", separator, opt(digit1))
        .map(|(_, _, _, number)| number)
        .parse_next(input)
}

fn pep440(input: &mut &str) -> ModalResult<String> {
    opt('v').parse_next(input)?;
    opt((digit1, '!')).parse_next(input)?;

    let mut out = release.parse_next(input)?.join(".");

    if let Some((kind, number)) = opt(pre_release).parse_next(input)? {
        out.push('_');
        out.push_str(kind);
        out.push_str(number.unwrap_or_default());
    }
    if let Some(number) = opt(post_release).parse_next(input)? {
        out.push_str("_p");
        out.push_str(number.unwrap_or_default());
    }
    if let Some(number) = opt(dev_release).parse_next(input)? {
        out.push_str("_pre");
        out.push_str(number.unwrap_or_default());
    }

    opt(preceded('+', rest)).parse_next(input)?;
    Ok(out)
}
