use std::collections::HashMap;

use winnow::prelude::*;
use winnow::token::take_while;

/// Maps registry license spellings onto Gentoo license names.
///
/// The registry's `license` field is free text: SPDX identifiers, prose
/// (`MIT License`), abbreviations (`GPLv3`) or a whole license file pasted
/// in. Trove classifiers (`License :: OSI Approved :: BSD License`) are a
/// second, more regular source.
///
/// See [PMS 7.2](https://projects.gentoo.org/pms/9/pms.html#mandatory-ebuilddefined-variables).
#[derive(Debug, Clone, Default)]
pub struct LicenseMap {
    /// Lowercased registry spelling -> Gentoo name.
    table: HashMap<String, String>,
}

/// Longest free-text value still treated as a license name.
const MAX_NAME_LEN: usize = 64;

impl LicenseMap {
    /// Build a map from registry spellings to Gentoo names.
    ///
    /// Keys are matched case-insensitively.
    pub fn new<I, K, V>(table: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        LicenseMap {
            table: table
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Pick the Gentoo license for a package.
    ///
    /// The `license` field wins when it maps through the table or already is
    /// a valid license name; otherwise the first `License ::` classifier that
    /// does is used.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::LicenseMap;
    ///
    /// let map = LicenseMap::new([("MIT License", "MIT"), ("BSD License", "BSD")]);
    /// assert_eq!(map.normalize(Some("MIT License"), &[]), Some("MIT".to_string()));
    /// assert_eq!(
    ///     map.normalize(None, &["License :: OSI Approved :: BSD License".to_string()]),
    ///     Some("BSD".to_string()),
    /// );
    /// ```
    pub fn normalize(&self, license: Option<&str>, classifiers: &[String]) -> Option<String> {
        let from_field = license
            .map(str::trim)
            .filter(|l| !l.is_empty() && l.len() <= MAX_NAME_LEN && !l.contains('\n'))
            .and_then(|l| self.lookup(l));

        from_field.or_else(|| {
            classifiers
                .iter()
                .filter_map(|c| c.strip_prefix("License ::"))
                .filter_map(|c| c.rsplit("::").next())
                .find_map(|c| self.lookup(c.trim()))
        })
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(mapped) = self.table.get(&name.to_ascii_lowercase()) {
            return Some(mapped.clone());
        }
        is_license_name(name).then(|| name.to_string())
    }
}

fn is_license_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

fn license_name<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., is_license_char)
        .verify(|name: &str| !name.starts_with(['-', '.', '+']))
        .parse_next(input)
}

/// Whether `name` is a valid license name (PMS 3.1.7).
pub fn is_license_name(name: &str) -> bool {
    license_name.parse(name).is_ok()
}
