//! Generate Gentoo ebuilds from [PyPI] package metadata.
//!
//! The registry describes dependencies as free-form `requires_dist`
//! strings. This crate parses them, maps package names into the target
//! category of an overlay (`dev-python` by default), groups optional
//! dependencies under USE flags and renders a `distutils-r1` ebuild. Run
//! recursively, it keeps generating ebuilds for referenced packages the
//! overlay lacks until nothing is missing.
//!
//! [PyPI]: https://pypi.org
//!
//! # Examples
//!
//! Resolve and group the requirements of one package:
//!
//! ```
//! use pypi_ebuild::{NameRegistry, NameResolver, RequirementGroups, RequirementPolicy};
//!
//! let resolver = NameResolver::new("dev-python");
//! let mut registry = NameRegistry::with_known(["bar"]);
//! let groups = RequirementGroups::build(
//!     ["bar (>=1.0)", "baz ; extra == 'x'"],
//!     &RequirementPolicy::default(),
//!     &resolver,
//!     &mut registry,
//! );
//! assert_eq!(
//!     groups.to_string(),
//!     "\t>=dev-python/bar-1.0[${PYTHON_USEDEP}]\n\tx? ( dev-python/baz[${PYTHON_USEDEP}] )\n",
//! );
//! assert!(registry.is_missing("baz"));
//! ```
//!
//! Generate ebuilds for a package and its missing dependencies:
//!
//! ```
//! use pypi_ebuild::{
//!     Config, Descriptor, Generator, NameRegistry, PackageRecord, StaticProvider,
//! };
//!
//! let provider: StaticProvider = [
//!     PackageRecord {
//!         name: "foo".into(),
//!         version: "1.2.3".into(),
//!         requires: vec!["bar (>=1.0)".into()],
//!         ..Default::default()
//!     },
//!     PackageRecord { name: "bar".into(), version: "1.0".into(), ..Default::default() },
//! ]
//! .into_iter()
//! .collect();
//!
//! let config = Config::default();
//! let mut generator = Generator::new(
//!     provider,
//!     Vec::<Descriptor>::new(),
//!     config.resolver(),
//!     config.policy(),
//!     config.descriptor_options(2026).unwrap(),
//! );
//! let report = generator.run(["foo"], true, &mut NameRegistry::new());
//! assert_eq!(report.emitted, ["dev-python/foo-1.2.3", "dev-python/bar-1.0"]);
//! ```

pub mod cli;
mod closure;
pub mod compat;
mod config;
mod descriptor;
mod error;
mod group;
mod iuse;
mod keyword;
mod license;
mod marker;
mod provider;
mod record;
mod repo;
mod requirement;
mod resolver;
pub mod version;

// Re-export public types
pub use closure::{DescriptorSink, Failure, Generator, Report};
pub use config::Config;
pub use descriptor::{Descriptor, DescriptorOptions, EAPI};
pub use error::{Error, Result};
pub use group::{FeatureBlock, RequirementGroups, RequirementPolicy};
pub use iuse::UseFlag;
pub use keyword::Keyword;
pub use license::{is_license_name, LicenseMap};
pub use marker::Condition;
pub use provider::{MetadataProvider, PypiClient, StaticProvider, DEFAULT_REGISTRY};
pub use record::PackageRecord;
pub use repo::{known_packages, scan_packages, Repository};
pub use requirement::{Requirement, VersionConstraint, VersionOp};
pub use resolver::{NameRegistry, NameResolver, Resolution, ResolvedAtom, PYTHON_USEDEP};
