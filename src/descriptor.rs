use std::fmt;

use portage_atom::Slot;

use crate::compat;
use crate::group::RequirementGroups;
use crate::iuse::UseFlag;
use crate::keyword::Keyword;
use crate::license::LicenseMap;
use crate::record::PackageRecord;
use crate::version;

/// EAPI written into generated ebuilds.
pub const EAPI: &str = "8";

/// Settings shared by every ebuild of a run.
#[derive(Debug, Clone)]
pub struct DescriptorOptions {
    /// Target category, e.g. `dev-python`.
    pub category: String,
    /// `KEYWORDS` to write.
    pub keywords: Vec<Keyword>,
    /// Python targets the repository supports, in writing order.
    pub python_targets: Vec<String>,
    /// License normalisation table.
    pub licenses: LicenseMap,
    /// Year in the copyright header.
    pub copyright_year: i32,
}

/// A generated ebuild.
///
/// Fields are in the order they are written; [`fmt::Display`] produces the
/// file contents.
#[derive(Debug, Clone)]
pub struct Descriptor {
    /// Category the ebuild belongs to.
    pub category: String,
    /// Package name within the category.
    pub package: String,
    /// Gentoo version of the release.
    pub version: String,
    /// Year in the copyright header.
    pub copyright_year: i32,
    /// `PYTHON_COMPAT` targets.
    pub python_compat: Vec<String>,
    /// `DESCRIPTION`
    pub description: String,
    /// `HOMEPAGE`
    pub homepage: String,
    /// `SRC_URI`
    pub src_uri: String,
    /// `LICENSE`; empty when it could not be determined.
    pub license: String,
    /// `SLOT`
    pub slot: Slot,
    /// `KEYWORDS`
    pub keywords: Vec<Keyword>,
    /// `IUSE`
    pub iuse: Vec<UseFlag>,
    /// `RDEPEND`
    pub rdepend: RequirementGroups,
}

impl Descriptor {
    /// Assemble the ebuild of `record`, published as `package` in the target
    /// category, from its already grouped dependencies.
    pub fn render(
        package: &str,
        record: &PackageRecord,
        rdepend: RequirementGroups,
        options: &DescriptorOptions,
    ) -> Descriptor {
        let license = options
            .licenses
            .normalize(record.license.as_deref(), &record.classifiers)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "{}: cannot map license {:?}, leaving LICENSE empty",
                    record.name,
                    record.license.as_deref().unwrap_or_default()
                );
                String::new()
            });

        let homepage = record
            .homepage
            .clone()
            .unwrap_or_else(|| format!("https://pypi.org/project/{}/", record.name));

        let src_uri = record.sdist_url.clone().unwrap_or_else(|| {
            format!(
                "https://files.pythonhosted.org/packages/source/{initial}/{name}/{name}-{version}.tar.gz",
                initial = record.name.chars().next().unwrap_or('_'),
                name = record.name,
                version = record.version,
            )
        });

        Descriptor {
            category: options.category.clone(),
            package: package.to_string(),
            version: version::to_gentoo_lossy(&record.version),
            copyright_year: options.copyright_year,
            python_compat: compat::python_compat(
                &record.classifiers,
                record.requires_python.as_deref(),
                &options.python_targets,
            ),
            description: record.summary.clone(),
            homepage,
            src_uri,
            license,
            slot: Slot::new("0"),
            keywords: options.keywords.clone(),
            iuse: rdepend.flags(),
            rdepend,
        }
    }

    /// `<package>-<version>.ebuild`
    pub fn file_name(&self) -> String {
        format!("{}-{}.ebuild", self.package, self.version)
    }

    /// `<category>/<package>-<version>`
    pub fn cpv(&self) -> String {
        format!("{}/{}-{}", self.category, self.package, self.version)
    }
}

/// Escape a value for a bash double-quoted string.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' | '$' | '`' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' | '\t' => out.push(' '),
            c => out.push(c),
        }
    }
    out.trim().to_string()
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "# Copyright 1999-{} Gentoo Authors", self.copyright_year)?;
        writeln!(f, "# Distributed under the terms of the GNU General Public License v2")?;
        writeln!(f)?;
        writeln!(f, "EAPI={EAPI}")?;
        writeln!(f)?;
        writeln!(f, "PYTHON_COMPAT=( {} )", self.python_compat.join(" "))?;
        writeln!(f, "DISTUTILS_USE_PEP517=setuptools")?;
        writeln!(f, "inherit distutils-r1")?;
        writeln!(f)?;
        writeln!(f, "DESCRIPTION=\"{}\"", quote(&self.description))?;
        writeln!(f, "HOMEPAGE=\"{}\"", quote(&self.homepage))?;
        writeln!(f, "SRC_URI=\"{}\"", quote(&self.src_uri))?;
        writeln!(f)?;
        writeln!(f, "LICENSE=\"{}\"", self.license)?;
        writeln!(f, "SLOT=\"{}\"", self.slot)?;
        writeln!(f, "KEYWORDS=\"{}\"", Keyword::join(&self.keywords))?;
        writeln!(f, "IUSE=\"{}\"", UseFlag::join(&self.iuse))?;
        writeln!(f)?;
        if self.rdepend.is_empty() {
            writeln!(f, "RDEPEND=\"\"")
        } else {
            writeln!(f, "RDEPEND=\"")?;
            write!(f, "{}", self.rdepend)?;
            writeln!(f, "\"")
        }
    }
}
