//! Package metadata as served by the PyPI JSON API.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Metadata of one release of a registry package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRecord {
    /// Registry name.
    pub name: String,
    /// Release version, as published.
    pub version: String,
    /// One-line summary.
    pub summary: String,
    /// Project homepage, if one is declared.
    pub homepage: Option<String>,
    /// Free-text license field.
    pub license: Option<String>,
    /// Trove classifiers in published order.
    pub classifiers: Vec<String>,
    /// Raw `requires_dist` entries; empty when none are declared.
    pub requires: Vec<String>,
    /// `requires_python` specifier.
    pub requires_python: Option<String>,
    /// URL of the source distribution of this release.
    pub sdist_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    info: Info,
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct Info {
    name: Option<String>,
    version: Option<String>,
    summary: Option<String>,
    home_page: Option<String>,
    license: Option<String>,
    #[serde(default)]
    classifiers: Vec<String>,
    requires_dist: Option<Vec<String>>,
    requires_python: Option<String>,
    project_urls: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    packagetype: String,
    url: String,
}

/// `project_urls` keys tried, in order, when `home_page` is empty.
const HOMEPAGE_KEYS: &[&str] = &[
    "Homepage",
    "homepage",
    "Home",
    "Source",
    "Source Code",
    "Repository",
];

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "UNKNOWN")
}

impl PackageRecord {
    /// Parse a `/pypi/<name>/json` document.
    ///
    /// `name` and `version` are required; a missing `requires_dist` means
    /// the package has no dependencies.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::PackageRecord;
    ///
    /// let json = r#"{"info": {"name": "foo", "version": "1.0", "requires_dist": null}}"#;
    /// let record = PackageRecord::from_json("foo", json).unwrap();
    /// assert_eq!(record.version, "1.0");
    /// assert!(record.requires.is_empty());
    /// ```
    pub fn from_json(package: &str, body: &str) -> Result<PackageRecord> {
        let doc: Document = serde_json::from_str(body).map_err(|e| Error::Schema {
            package: package.to_string(),
            message: e.to_string(),
        })?;
        let info = doc.info;

        let missing = |field: &str| Error::Schema {
            package: package.to_string(),
            message: format!("missing field `{field}`"),
        };
        let name = non_empty(info.name).ok_or_else(|| missing("name"))?;
        let version = non_empty(info.version).ok_or_else(|| missing("version"))?;

        let homepage = non_empty(info.home_page).or_else(|| {
            let urls = info.project_urls.as_ref()?;
            HOMEPAGE_KEYS
                .iter()
                .find_map(|key| non_empty(urls.get(*key).cloned()))
        });

        let sdist_url = doc
            .urls
            .into_iter()
            .find(|f| f.packagetype == "sdist")
            .map(|f| f.url);

        Ok(PackageRecord {
            name,
            version,
            summary: non_empty(info.summary).unwrap_or_default(),
            homepage,
            license: non_empty(info.license),
            classifiers: info.classifiers,
            requires: info.requires_dist.unwrap_or_default(),
            requires_python: non_empty(info.requires_python),
            sdist_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUESTS: &str = r#"{
        "info": {
            "name": "requests",
            "version": "2.32.3",
            "summary": "Python HTTP for Humans.",
            "home_page": "https://requests.readthedocs.io",
            "license": "Apache-2.0",
            "classifiers": [
                "License :: OSI Approved :: Apache Software License",
                "Programming Language :: Python :: 3.12"
            ],
            "requires_dist": [
                "charset-normalizer<4,>=2",
                "idna<4,>=2.5",
                "PySocks!=1.5.7,>=1.5.6; extra == \"socks\""
            ],
            "requires_python": ">=3.8",
            "project_urls": {"Source": "https://github.com/psf/requests"}
        },
        "urls": [
            {"packagetype": "bdist_wheel", "url": "https://files.example/requests-2.32.3-py3-none-any.whl"},
            {"packagetype": "sdist", "url": "https://files.example/requests-2.32.3.tar.gz"}
        ]
    }"#;

    #[test]
    fn parses_full_document() {
        let record = PackageRecord::from_json("requests", REQUESTS).unwrap();
        assert_eq!(record.name, "requests");
        assert_eq!(record.version, "2.32.3");
        assert_eq!(record.summary, "Python HTTP for Humans.");
        assert_eq!(record.homepage.as_deref(), Some("https://requests.readthedocs.io"));
        assert_eq!(record.license.as_deref(), Some("Apache-2.0"));
        assert_eq!(record.classifiers.len(), 2);
        assert_eq!(record.requires.len(), 3);
        assert_eq!(record.requires_python.as_deref(), Some(">=3.8"));
        assert_eq!(
            record.sdist_url.as_deref(),
            Some("https://files.example/requests-2.32.3.tar.gz")
        );
    }

    #[test]
    fn null_requirements_mean_none() {
        let json = r#"{"info": {"name": "six", "version": "1.16.0", "requires_dist": null}}"#;
        let record = PackageRecord::from_json("six", json).unwrap();
        assert!(record.requires.is_empty());
        assert!(record.sdist_url.is_none());
        assert_eq!(record.summary, "");
    }

    #[test]
    fn homepage_falls_back_to_project_urls() {
        let json = r#"{"info": {"name": "x", "version": "1", "home_page": "",
            "project_urls": {"Homepage": "https://x.example"}}}"#;
        let record = PackageRecord::from_json("x", json).unwrap();
        assert_eq!(record.homepage.as_deref(), Some("https://x.example"));
    }

    #[test]
    fn unknown_placeholders_are_dropped() {
        let json = r#"{"info": {"name": "x", "version": "1", "license": "UNKNOWN"}}"#;
        let record = PackageRecord::from_json("x", json).unwrap();
        assert_eq!(record.license, None);
    }

    #[test]
    fn missing_version_is_schema_error() {
        let json = r#"{"info": {"name": "x"}}"#;
        let err = PackageRecord::from_json("x", json).unwrap_err();
        assert!(matches!(err, Error::Schema { ref message, .. } if message.contains("version")));
    }

    #[test]
    fn malformed_body_is_schema_error() {
        let err = PackageRecord::from_json("x", "<html>").unwrap_err();
        assert!(matches!(err, Error::Schema { ref package, .. } if package == "x"));
    }
}
