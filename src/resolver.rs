//! Mapping registry package names onto repository atoms.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::requirement::{VersionConstraint, VersionOp};
use crate::version;

/// USE dependency appended to every atom in the Python category.
pub const PYTHON_USEDEP: &str = "[${PYTHON_USEDEP}]";

/// Which target names exist in the repository and which are still needed.
///
/// A name is either *known* (an ebuild exists or was just generated) or
/// *missing* (referenced by a generated ebuild but not known), never both.
/// Once known, a name is never recorded as missing again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    known: BTreeSet<String>,
    /// Target name -> registry name to fetch it under.
    missing: BTreeMap<String, String>,
}

impl NameRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with names already present in the repository.
    pub fn with_known<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameRegistry {
            known: names.into_iter().map(Into::into).collect(),
            missing: BTreeMap::new(),
        }
    }

    /// Whether `name` exists in the repository.
    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Whether `name` is referenced but not yet generated.
    pub fn is_missing(&self, name: &str) -> bool {
        self.missing.contains_key(name)
    }

    /// Record that `name` now exists, dropping it from the missing set.
    pub fn mark_known(&mut self, name: &str) {
        self.missing.remove(name);
        self.known.insert(name.to_string());
    }

    /// Stop tracking `name` as missing without claiming it exists.
    pub fn forget_missing(&mut self, name: &str) -> Option<String> {
        self.missing.remove(name)
    }

    /// Record `target` as missing, to be fetched as `source`.
    ///
    /// Returns `true` if the name was newly recorded.
    fn note_missing(&mut self, target: &str, source: &str) -> bool {
        if self.known.contains(target) || self.missing.contains_key(target) {
            return false;
        }
        self.missing.insert(target.to_string(), source.to_string());
        true
    }

    /// Missing target names with the registry name each is fetched under,
    /// sorted by target name.
    pub fn missing(&self) -> impl Iterator<Item = (&str, &str)> {
        self.missing.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }

    /// Number of missing names.
    pub fn missing_len(&self) -> usize {
        self.missing.len()
    }

    /// Number of known names.
    pub fn known_len(&self) -> usize {
        self.known.len()
    }
}

/// Outcome of resolving one registry name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// An exception table entry; the atom is used verbatim and may be empty
    /// when no dependency is needed at all.
    Override(String),
    /// The package exists in the repository.
    Known(String),
    /// The package does not exist yet and has been recorded as missing.
    Missing(String),
}

impl Resolution {
    /// `true` when the package still has to be generated.
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Missing(_))
    }
}

/// Resolves registry names into the target category.
///
/// Lookup order after folding `.` to `-`: exception table, rename table,
/// then the folded name itself. All lookups are exact and case-sensitive.
#[derive(Debug, Clone)]
pub struct NameResolver {
    category: String,
    exceptions: HashMap<String, String>,
    renames: HashMap<String, String>,
}

impl NameResolver {
    /// A resolver for `category` without override tables.
    pub fn new(category: impl Into<String>) -> Self {
        NameResolver {
            category: category.into(),
            exceptions: HashMap::new(),
            renames: HashMap::new(),
        }
    }

    /// Set the exception table (name -> full atom, possibly empty).
    pub fn with_exceptions(mut self, exceptions: HashMap<String, String>) -> Self {
        self.exceptions = exceptions;
        self
    }

    /// Set the rename table (name -> canonical package name).
    pub fn with_renames(mut self, renames: HashMap<String, String>) -> Self {
        self.renames = renames;
        self
    }

    /// Target category, e.g. `dev-python`.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Package name in the target category, ignoring exceptions.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use pypi_ebuild::NameResolver;
    ///
    /// let resolver = NameResolver::new("dev-python")
    ///     .with_renames(HashMap::from([("Jinja2".to_string(), "jinja2".to_string())]));
    /// assert_eq!(resolver.target_name("Jinja2"), "jinja2");
    /// assert_eq!(resolver.target_name("zope.interface"), "zope-interface");
    /// ```
    pub fn target_name(&self, name: &str) -> String {
        let folded = fold(name);
        match self.renames.get(&folded) {
            Some(renamed) => renamed.clone(),
            None => folded,
        }
    }

    /// Resolve `name`, recording it in `registry` when it is not known.
    ///
    /// Resolving the same name twice yields the same result and records it
    /// at most once.
    pub fn resolve(&self, name: &str, registry: &mut NameRegistry) -> Resolution {
        let folded = fold(name);
        if let Some(atom) = self.exceptions.get(&folded) {
            tracing::debug!("{name} overridden as {atom:?}");
            return Resolution::Override(atom.clone());
        }

        let target = self.target_name(name);
        if registry.is_known(&target) {
            return Resolution::Known(target);
        }
        if registry.note_missing(&target, name) {
            tracing::warn!("{}/{target} is not in the repository", self.category);
        }
        Resolution::Missing(target)
    }

    /// Resolve `name` and attach `constraint`.
    pub fn resolve_atom(
        &self,
        name: &str,
        constraint: Option<VersionConstraint>,
        registry: &mut NameRegistry,
    ) -> ResolvedAtom {
        let resolution = self.resolve(name, registry);
        ResolvedAtom::new(&self.category, resolution, constraint)
    }
}

fn fold(name: &str) -> String {
    name.trim().replace('.', "-")
}

/// A dependency ready to be placed in `RDEPEND`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedAtom {
    /// How the name was resolved.
    pub resolution: Resolution,
    /// Version constraint from the requirement, unchanged.
    pub constraint: Option<VersionConstraint>,
    atom: String,
}

impl ResolvedAtom {
    /// Build the atom for a resolution.
    ///
    /// Overrides are used verbatim and ignore the constraint. Anything else
    /// becomes `[op]category/name[-version][${PYTHON_USEDEP}]`.
    pub fn new(
        category: &str,
        resolution: Resolution,
        constraint: Option<VersionConstraint>,
    ) -> Self {
        let atom = match (&resolution, &constraint) {
            (Resolution::Override(atom), _) => atom.trim().to_string(),
            (Resolution::Known(name) | Resolution::Missing(name), None) => {
                format!("{category}/{name}{PYTHON_USEDEP}")
            }
            (Resolution::Known(name) | Resolution::Missing(name), Some(c)) => {
                let (op, version) = render_constraint(c);
                format!("{op}{category}/{name}-{version}{PYTHON_USEDEP}")
            }
        };
        ResolvedAtom {
            resolution,
            constraint,
            atom,
        }
    }

    /// Rendered atom; empty for an empty override.
    pub fn as_str(&self) -> &str {
        &self.atom
    }

    /// `true` when the atom contributes nothing to `RDEPEND`.
    pub fn is_empty(&self) -> bool {
        self.atom.is_empty()
    }
}

fn render_constraint(constraint: &VersionConstraint) -> (&'static str, String) {
    match constraint.op {
        VersionOp::Minimum => (">=", version::to_gentoo_lossy(&constraint.version)),
        VersionOp::Exact => match constraint.version.strip_suffix(".*") {
            Some(prefix) => ("=", format!("{}*", version::to_gentoo_lossy(prefix))),
            None => ("=", version::to_gentoo_lossy(&constraint.version)),
        },
    }
}

impl fmt::Display for ResolvedAtom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> NameResolver {
        NameResolver::new("dev-python")
            .with_exceptions(HashMap::from([
                ("tensorflow".to_string(), "sci-libs/tensorflow[python]".to_string()),
                ("argparse".to_string(), String::new()),
            ]))
            .with_renames(HashMap::from([
                ("Jinja2".to_string(), "jinja2".to_string()),
                ("typing_extensions".to_string(), "typing-extensions".to_string()),
            ]))
    }

    #[test]
    fn default_prefixes_category() {
        let mut registry = NameRegistry::new();
        let atom = resolver().resolve_atom("bar", None, &mut registry);
        assert_eq!(atom.as_str(), "dev-python/bar[${PYTHON_USEDEP}]");
        assert_eq!(atom.resolution, Resolution::Missing("bar".to_string()));
        assert!(registry.is_missing("bar"));
    }

    #[test]
    fn known_names_are_not_missing() {
        let mut registry = NameRegistry::with_known(["bar"]);
        let resolution = resolver().resolve("bar", &mut registry);
        assert_eq!(resolution, Resolution::Known("bar".to_string()));
        assert!(!resolution.is_pending());
        assert_eq!(registry.missing_len(), 0);
    }

    #[test]
    fn exceptions_bypass_tracking() {
        let mut registry = NameRegistry::new();
        let atom = resolver().resolve_atom(
            "tensorflow",
            Some(VersionConstraint::minimum("2.0")),
            &mut registry,
        );
        assert_eq!(atom.as_str(), "sci-libs/tensorflow[python]");
        assert!(matches!(atom.resolution, Resolution::Override(_)));
        assert!(!atom.resolution.is_pending());

        let atom = resolver().resolve_atom("argparse", None, &mut registry);
        assert!(atom.is_empty());
        assert_eq!(registry.missing_len(), 0);
    }

    #[test]
    fn renames_apply_before_prefixing() {
        let mut registry = NameRegistry::new();
        let atom = resolver().resolve_atom(
            "Jinja2",
            Some(VersionConstraint::minimum("3.0")),
            &mut registry,
        );
        assert_eq!(atom.as_str(), ">=dev-python/jinja2-3.0[${PYTHON_USEDEP}]");
        let missing: Vec<_> = registry.missing().collect();
        assert_eq!(missing, vec![("jinja2", "Jinja2")]);
    }

    #[test]
    fn dots_fold_to_dashes() {
        let mut registry = NameRegistry::new();
        let resolution = resolver().resolve("zope.interface", &mut registry);
        assert_eq!(resolution, Resolution::Missing("zope-interface".to_string()));
        let missing: Vec<_> = registry.missing().collect();
        assert_eq!(missing, vec![("zope-interface", "zope.interface")]);
    }

    #[test]
    fn lookups_are_case_sensitive() {
        let mut registry = NameRegistry::new();
        let resolution = resolver().resolve("jinja2", &mut registry);
        assert_eq!(resolution, Resolution::Missing("jinja2".to_string()));
        let resolution = resolver().resolve("TensorFlow", &mut registry);
        assert_eq!(resolution, Resolution::Missing("TensorFlow".to_string()));
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut registry = NameRegistry::new();
        let first = resolver().resolve("bar", &mut registry);
        let snapshot = registry.clone();
        let second = resolver().resolve("bar", &mut registry);
        assert_eq!(first, second);
        assert_eq!(registry, snapshot);
        assert_eq!(registry.missing_len(), 1);
    }

    #[test]
    fn mark_known_moves_out_of_missing() {
        let mut registry = NameRegistry::new();
        resolver().resolve("bar", &mut registry);
        registry.mark_known("bar");
        assert!(registry.is_known("bar"));
        assert!(!registry.is_missing("bar"));

        resolver().resolve("bar", &mut registry);
        assert_eq!(registry.missing_len(), 0);
    }

    #[test]
    fn exact_and_wildcard_constraints() {
        let mut registry = NameRegistry::new();
        let atom = resolver().resolve_atom(
            "baz",
            Some(VersionConstraint::exact("1.4.2")),
            &mut registry,
        );
        assert_eq!(atom.as_str(), "=dev-python/baz-1.4.2[${PYTHON_USEDEP}]");

        let atom = resolver().resolve_atom(
            "baz",
            Some(VersionConstraint::exact("1.*")),
            &mut registry,
        );
        assert_eq!(atom.as_str(), "=dev-python/baz-1*[${PYTHON_USEDEP}]");
    }

    #[test]
    fn pre_release_constraints_use_gentoo_suffixes() {
        let mut registry = NameRegistry::new();
        let atom = resolver().resolve_atom(
            "baz",
            Some(VersionConstraint::minimum("2.0rc1")),
            &mut registry,
        );
        assert_eq!(atom.as_str(), ">=dev-python/baz-2.0_rc1[${PYTHON_USEDEP}]");
        assert_eq!(atom.constraint, Some(VersionConstraint::minimum("2.0rc1")));
    }
}
