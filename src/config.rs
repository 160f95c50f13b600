//! Run configuration: built-in defaults overlaid with an optional YAML file.
//!
//! ```yaml
//! category: dev-python
//! retries: 4
//! keywords: "~amd64 ~arm64"
//! exceptions:
//!   tensorflow: sci-libs/tensorflow[python]
//! renames:
//!   Babel: babel
//! removals: [enum34, typing]
//! ```
//!
//! Scalars replace the default, the `exceptions`, `renames` and `licenses`
//! tables are merged key by key, and lists replace the default list.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portage_atom::DepEntry;
use serde::Deserialize;

use crate::descriptor::DescriptorOptions;
use crate::error::{Error, Result};
use crate::group::RequirementPolicy;
use crate::keyword::Keyword;
use crate::license::LicenseMap;
use crate::provider::{PypiClient, DEFAULT_REGISTRY};
use crate::resolver::{NameResolver, PYTHON_USEDEP};

/// Effective configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Category generated ebuilds are placed in.
    pub category: String,
    /// Base URL of the package registry.
    pub registry_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transport error or 5xx answer.
    pub retries: u32,
    /// `KEYWORDS` line, e.g. `~amd64 ~x86`.
    pub keywords: String,
    /// Supported `PYTHON_COMPAT` targets, in writing order.
    pub python_targets: Vec<String>,
    /// Registry name -> verbatim atom (empty for no dependency).
    pub exceptions: BTreeMap<String, String>,
    /// Registry name -> package name in the category.
    pub renames: BTreeMap<String, String>,
    /// Registry names never depended upon.
    pub removals: Vec<String>,
    /// Prefixes of backport packages dropped when gated on an old Python.
    pub backport_prefixes: Vec<String>,
    /// Extras that never become USE flags.
    pub ignored_features: Vec<String>,
    /// Registry license spelling -> Gentoo license name.
    pub licenses: BTreeMap<String, String>,
    /// Extra trees whose packages count as existing.
    pub known_trees: Vec<PathBuf>,
}

/// What a configuration file may set; everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    category: Option<String>,
    registry_url: Option<String>,
    timeout_secs: Option<u64>,
    retries: Option<u32>,
    keywords: Option<String>,
    python_targets: Option<Vec<String>>,
    exceptions: BTreeMap<String, String>,
    renames: BTreeMap<String, String>,
    removals: Option<Vec<String>>,
    backport_prefixes: Option<Vec<String>>,
    ignored_features: Option<Vec<String>>,
    licenses: BTreeMap<String, String>,
    known_trees: Option<Vec<PathBuf>>,
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn list(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            category: "dev-python".to_string(),
            registry_url: DEFAULT_REGISTRY.to_string(),
            timeout_secs: 30,
            retries: 2,
            keywords: "~amd64 ~x86".to_string(),
            python_targets: list(&["python3_11", "python3_12", "python3_13"]),
            exceptions: table(&[
                ("argparse", ""),
                ("wsgiref", ""),
                ("tensorflow", "sci-libs/tensorflow[python]"),
                ("tensorflow-gpu", "sci-libs/tensorflow[python,cuda]"),
                ("torch", "sci-libs/pytorch[python]"),
                ("PyQt5", "dev-python/PyQt5"),
                ("PyQt6", "dev-python/PyQt6"),
            ]),
            renames: table(&[
                ("Babel", "babel"),
                ("Jinja2", "jinja2"),
                ("MarkupSafe", "markupsafe"),
                ("Pillow", "pillow"),
                ("PyJWT", "pyjwt"),
                ("PyYAML", "pyyaml"),
                ("Pygments", "pygments"),
                ("SQLAlchemy", "sqlalchemy"),
                ("Werkzeug", "werkzeug"),
                ("typing_extensions", "typing-extensions"),
            ]),
            removals: list(&["enum34", "futures", "typing", "pathlib", "singledispatch"]),
            backport_prefixes: list(&[
                "backports",
                "importlib",
                "dataclasses",
                "exceptiongroup",
                "tomli",
            ]),
            ignored_features: list(&[
                "all", "dev", "develop", "doc", "docs", "lint", "test", "testing", "tests",
            ]),
            licenses: table(&[
                ("Apache 2.0", "Apache-2.0"),
                ("Apache License 2.0", "Apache-2.0"),
                ("Apache Software License", "Apache-2.0"),
                ("Apache-2", "Apache-2.0"),
                ("BSD", "BSD"),
                ("BSD License", "BSD"),
                ("BSD-2-Clause", "BSD-2"),
                ("BSD-3-Clause", "BSD"),
                ("GNU General Public License v2 (GPLv2)", "GPL-2"),
                ("GNU General Public License v3 (GPLv3)", "GPL-3"),
                ("GNU Lesser General Public License v3 (LGPLv3)", "LGPL-3"),
                ("GPLv2", "GPL-2"),
                ("GPLv3", "GPL-3"),
                ("GPL-3.0-or-later", "GPL-3+"),
                ("ISC License (ISCL)", "ISC"),
                ("LGPLv3", "LGPL-3"),
                ("MIT License", "MIT"),
                ("Mozilla Public License 2.0 (MPL 2.0)", "MPL-2.0"),
                ("Python Software Foundation License", "PSF-2"),
                ("PSF", "PSF-2"),
                ("Zope Public License", "ZPL"),
            ]),
            known_trees: vec![PathBuf::from("/var/db/repos/gentoo")],
        }
    }
}

impl Config {
    /// Defaults, overlaid with the file at `path` if one is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let content = fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        Config::from_yaml(&content).map_err(|e| match e {
            Error::InvalidConfig(message) => {
                Error::InvalidConfig(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Defaults, overlaid with a YAML document.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::Config;
    ///
    /// let config = Config::from_yaml("retries: 5\nrenames:\n  Foo: foo\n").unwrap();
    /// assert_eq!(config.retries, 5);
    /// assert_eq!(config.renames["Foo"], "foo");
    /// assert_eq!(config.renames["Jinja2"], "jinja2");
    /// ```
    pub fn from_yaml(content: &str) -> Result<Config> {
        let file: Option<ConfigFile> =
            serde_yaml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let mut config = Config::default();
        if let Some(file) = file {
            config.overlay(file);
        }
        config.validate()?;
        Ok(config)
    }

    fn overlay(&mut self, file: ConfigFile) {
        if let Some(category) = file.category {
            self.category = category;
        }
        if let Some(url) = file.registry_url {
            self.registry_url = url;
        }
        if let Some(timeout) = file.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = file.retries {
            self.retries = retries;
        }
        if let Some(keywords) = file.keywords {
            self.keywords = keywords;
        }
        if let Some(targets) = file.python_targets {
            self.python_targets = targets;
        }
        self.exceptions.extend(file.exceptions);
        self.renames.extend(file.renames);
        self.licenses.extend(file.licenses);
        if let Some(removals) = file.removals {
            self.removals = removals;
        }
        if let Some(prefixes) = file.backport_prefixes {
            self.backport_prefixes = prefixes;
        }
        if let Some(features) = file.ignored_features {
            self.ignored_features = features;
        }
        if let Some(trees) = file.known_trees {
            self.known_trees = trees;
        }
    }

    /// Check values that would otherwise only fail mid-run.
    pub fn validate(&self) -> Result<()> {
        let valid_category = self
            .category
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
            && !self.category.is_empty()
            && !self.category.starts_with(['-', '.']);
        if !valid_category {
            return Err(Error::InvalidConfig(format!(
                "invalid category: {:?}",
                self.category
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig("timeout_secs must be positive".to_string()));
        }
        if self.python_targets.is_empty() {
            return Err(Error::InvalidConfig("python_targets is empty".to_string()));
        }
        self.keywords()?;

        for (name, atom) in &self.exceptions {
            let atom = atom.trim();
            if atom.is_empty() {
                continue;
            }
            let plain = atom.replace(PYTHON_USEDEP, "");
            match DepEntry::parse(&plain) {
                Ok(entries) if entries.len() == 1 => {}
                Ok(_) => {
                    return Err(Error::InvalidConfig(format!(
                        "exception for {name} must be a single atom: {atom}"
                    )))
                }
                Err(e) => {
                    return Err(Error::InvalidConfig(format!(
                        "exception for {name}: {atom}: {e}"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Parsed `KEYWORDS`.
    pub fn keywords(&self) -> Result<Vec<Keyword>> {
        Keyword::parse_line(&self.keywords)
    }

    /// Name resolver for the configured category and tables.
    pub fn resolver(&self) -> NameResolver {
        let to_map = |t: &BTreeMap<String, String>| -> HashMap<String, String> {
            t.iter().map(|(k, v)| (k.replace('.', "-"), v.clone())).collect()
        };
        NameResolver::new(&self.category)
            .with_exceptions(to_map(&self.exceptions))
            .with_renames(to_map(&self.renames))
    }

    /// Requirement filtering policy.
    pub fn policy(&self) -> RequirementPolicy {
        RequirementPolicy {
            removals: self.removals.iter().cloned().collect(),
            backport_prefixes: self.backport_prefixes.clone(),
            ignored_features: self
                .ignored_features
                .iter()
                .map(|f| f.to_ascii_lowercase())
                .collect::<HashSet<_>>(),
        }
    }

    /// Options shared by every rendered ebuild.
    pub fn descriptor_options(&self, copyright_year: i32) -> Result<DescriptorOptions> {
        Ok(DescriptorOptions {
            category: self.category.clone(),
            keywords: self.keywords()?,
            python_targets: self.python_targets.clone(),
            licenses: LicenseMap::new(&self.licenses),
            copyright_year,
        })
    }

    /// HTTP client for the configured registry.
    pub fn client(&self) -> Result<PypiClient> {
        PypiClient::with_options(
            &self.registry_url,
            Duration::from_secs(self.timeout_secs),
            self.retries,
        )
    }
}
