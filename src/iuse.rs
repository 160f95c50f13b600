use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A USE flag generated for one of a package's extras.
///
/// Registry extras are free-form (`Socks`, `s3.fs`, `with_ssl`); USE flag
/// names must match `[A-Za-z0-9][A-Za-z0-9+_@-]*`.
///
/// See [PMS 3.1.4](https://projects.gentoo.org/pms/9/pms.html#use-flag-names).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseFlag(String);

fn is_flag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '@' | '-')
}

impl UseFlag {
    /// Derive a flag from an extra name.
    ///
    /// The name is lowercased, `.` becomes `-` and any other character that
    /// is not allowed in a flag becomes `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::UseFlag;
    ///
    /// assert_eq!(UseFlag::from_extra("Socks").unwrap().as_str(), "socks");
    /// assert_eq!(UseFlag::from_extra("s3.fs").unwrap().as_str(), "s3-fs");
    /// ```
    pub fn from_extra(extra: &str) -> Result<UseFlag> {
        let name: String = extra
            .trim()
            .chars()
            .map(|c| match c.to_ascii_lowercase() {
                '.' => '-',
                c if is_flag_char(c) => c,
                _ => '_',
            })
            .skip_while(|c| !c.is_ascii_alphanumeric())
            .collect();
        name.parse()
    }

    /// The flag name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render flags the way they appear in `IUSE="..."`.
    pub fn join(flags: &[UseFlag]) -> String {
        flags
            .iter()
            .map(UseFlag::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for UseFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() && chars.all(is_flag_char) => {
                Ok(UseFlag(s.to_string()))
            }
            _ => Err(Error::InvalidUseFlag(format!("{s:?}"))),
        }
    }
}

impl fmt::Display for UseFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_extra() {
        assert_eq!(UseFlag::from_extra("plot").unwrap().as_str(), "plot");
    }

    #[test]
    fn lowercases_and_folds() {
        assert_eq!(UseFlag::from_extra("PySide").unwrap().as_str(), "pyside");
        assert_eq!(UseFlag::from_extra("gs.fs").unwrap().as_str(), "gs-fs");
        assert_eq!(UseFlag::from_extra("with ssl").unwrap().as_str(), "with_ssl");
    }

    #[test]
    fn leading_separators_dropped() {
        assert_eq!(UseFlag::from_extra("_private").unwrap().as_str(), "private");
    }

    #[test]
    fn underscores_and_at_are_kept() {
        let flag: UseFlag = "python_targets_python3_12".parse().unwrap();
        assert_eq!(flag.to_string(), "python_targets_python3_12");
        assert!("flag@name".parse::<UseFlag>().is_ok());
    }

    #[test]
    fn empty_or_symbol_only_is_rejected() {
        assert!(UseFlag::from_extra("").is_err());
        assert!(UseFlag::from_extra("--").is_err());
        assert_eq!(
            "-debug".parse::<UseFlag>().unwrap_err(),
            Error::InvalidUseFlag("\"-debug\"".to_string())
        );
    }

    #[test]
    fn join_flags() {
        let flags = vec![
            UseFlag::from_extra("socks").unwrap(),
            UseFlag::from_extra("http2").unwrap(),
        ];
        assert_eq!(UseFlag::join(&flags), "socks http2");
    }
}
