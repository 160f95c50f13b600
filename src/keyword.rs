use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An architecture keyword placed in a generated ebuild's `KEYWORDS`.
///
/// Freshly generated ebuilds are either keyworded for testing (`~amd64`) or,
/// when a user explicitly asks for it, stable (`amd64`). Masking forms such as
/// `-x86` or `-*` make no sense for a new package and are rejected.
///
/// See [PMS 7.3.3](https://projects.gentoo.org/pms/9/pms.html#keywords).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword {
    /// Architecture name (e.g. `amd64`, `arm64`).
    pub arch: String,
    /// `true` for `~arch`.
    pub testing: bool,
}

impl Keyword {
    /// Parse a space-separated keyword list as written in the configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::Keyword;
    ///
    /// let kws = Keyword::parse_line("~amd64 arm64").unwrap();
    /// assert!(kws[0].testing);
    /// assert!(!kws[1].testing);
    /// ```
    pub fn parse_line(input: &str) -> Result<Vec<Keyword>> {
        input.split_whitespace().map(str::parse).collect()
    }

    /// Render a keyword list the way it appears in `KEYWORDS="..."`.
    pub fn join(keywords: &[Keyword]) -> String {
        keywords
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_arch_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl FromStr for Keyword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (arch, testing) = match s.strip_prefix('~') {
            Some(arch) => (arch, true),
            None => (s, false),
        };

        if arch.is_empty() || arch.starts_with('-') || !arch.chars().all(is_arch_char) {
            return Err(Error::InvalidConfig(format!("invalid keyword: {s:?}")));
        }

        Ok(Keyword {
            arch: arch.to_string(),
            testing,
        })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.testing {
            write!(f, "~{}", self.arch)
        } else {
            f.write_str(&self.arch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_testing_and_stable() {
        let kws = Keyword::parse_line("~amd64 ~x86 arm64").unwrap();
        assert_eq!(kws.len(), 3);
        assert_eq!(kws[0].arch, "amd64");
        assert!(kws[0].testing);
        assert_eq!(kws[2].arch, "arm64");
        assert!(!kws[2].testing);
    }

    #[test]
    fn join_keeps_order() {
        let kws = Keyword::parse_line("~amd64  ~x86").unwrap();
        assert_eq!(Keyword::join(&kws), "~amd64 ~x86");
    }

    #[test]
    fn masking_forms_are_rejected() {
        assert!("-x86".parse::<Keyword>().is_err());
        assert!("-*".parse::<Keyword>().is_err());
        assert!("~".parse::<Keyword>().is_err());
        assert!("amd64!".parse::<Keyword>().is_err());
    }

    #[test]
    fn empty_line_is_empty() {
        assert!(Keyword::parse_line("   ").unwrap().is_empty());
    }
}
