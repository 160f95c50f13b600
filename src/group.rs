//! Grouping parsed requirements into `RDEPEND` blocks.

use std::collections::HashSet;
use std::fmt;

use crate::iuse::UseFlag;
use crate::marker::Condition;
use crate::requirement::Requirement;
use crate::resolver::{NameRegistry, NameResolver, ResolvedAtom};

/// Which requirements are dropped before resolution.
#[derive(Debug, Clone, Default)]
pub struct RequirementPolicy {
    /// Registry names never turned into dependencies.
    pub removals: HashSet<String>,
    /// Name prefixes marking backports, dropped when gated on an old Python.
    pub backport_prefixes: Vec<String>,
    /// Extras that never become USE flags (documentation, tests, ...).
    pub ignored_features: HashSet<String>,
}

impl RequirementPolicy {
    /// Whether `req` survives the removal list and the backport filter.
    pub fn admits(&self, req: &Requirement) -> bool {
        let folded = req.name.replace('.', "-");
        if self.removals.contains(&req.name) || self.removals.contains(&folded) {
            return false;
        }
        match &req.condition {
            Condition::PythonBelow(_) => !self.backport_prefixes.iter().any(|prefix| {
                req.name.starts_with(prefix.as_str()) || folded.starts_with(prefix.as_str())
            }),
            _ => true,
        }
    }

    /// Whether dependencies gated on `feature` are discarded.
    pub fn ignores_feature(&self, feature: &str) -> bool {
        self.ignored_features.contains(&feature.to_ascii_lowercase())
    }
}

/// Dependencies guarded by one USE flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureBlock {
    /// USE flag guarding the block.
    pub flag: UseFlag,
    /// Atoms in order of appearance.
    pub atoms: Vec<ResolvedAtom>,
}

/// Resolved dependencies of one package.
///
/// Unconditional atoms come first in order of appearance, followed by one
/// block per surviving feature in the order features were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementGroups {
    /// Always-required atoms.
    pub unconditional: Vec<ResolvedAtom>,
    /// Feature-gated blocks.
    pub features: Vec<FeatureBlock>,
}

impl RequirementGroups {
    /// Parse, filter, resolve and group raw `requires_dist` entries.
    ///
    /// Entries that cannot be parsed are logged and skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use pypi_ebuild::{NameRegistry, NameResolver, RequirementGroups, RequirementPolicy};
    ///
    /// let resolver = NameResolver::new("dev-python");
    /// let mut registry = NameRegistry::new();
    /// let groups = RequirementGroups::build(
    ///     ["bar (>=1.0)", "baz ; extra == 'x'"],
    ///     &RequirementPolicy::default(),
    ///     &resolver,
    ///     &mut registry,
    /// );
    /// assert_eq!(groups.unconditional[0].as_str(), ">=dev-python/bar-1.0[${PYTHON_USEDEP}]");
    /// assert_eq!(groups.features[0].flag.as_str(), "x");
    /// ```
    pub fn build<I, S>(
        raw: I,
        policy: &RequirementPolicy,
        resolver: &NameResolver,
        registry: &mut NameRegistry,
    ) -> RequirementGroups
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requirements = raw.into_iter().filter_map(|raw| {
            let raw = raw.as_ref();
            match Requirement::parse(raw) {
                Ok(req) => Some(req),
                Err(err) => {
                    tracing::warn!("skipping requirement: {err}");
                    None
                }
            }
        });
        Self::group(requirements, policy, resolver, registry)
    }

    /// Filter, resolve and group already parsed requirements.
    pub fn group<I>(
        requirements: I,
        policy: &RequirementPolicy,
        resolver: &NameResolver,
        registry: &mut NameRegistry,
    ) -> RequirementGroups
    where
        I: IntoIterator<Item = Requirement>,
    {
        let mut groups = RequirementGroups::default();

        for req in requirements {
            if !policy.admits(&req) {
                tracing::debug!("dropping {} ({:?})", req.name, req.condition);
                continue;
            }

            let target = match &req.condition {
                Condition::Unconditional | Condition::PythonBelow(_) => &mut groups.unconditional,
                Condition::Extra(feature) => {
                    if policy.ignores_feature(feature) {
                        tracing::debug!("dropping {} for ignored extra {feature}", req.name);
                        continue;
                    }
                    let flag = match UseFlag::from_extra(feature) {
                        Ok(flag) => flag,
                        Err(err) => {
                            tracing::warn!("skipping {}: {err}", req.name);
                            continue;
                        }
                    };
                    let index = match groups.features.iter().position(|b| b.flag == flag) {
                        Some(index) => index,
                        None => {
                            groups.features.push(FeatureBlock {
                                flag,
                                atoms: Vec::new(),
                            });
                            groups.features.len() - 1
                        }
                    };
                    &mut groups.features[index].atoms
                }
            };

            let atom = resolver.resolve_atom(&req.name, req.constraint, registry);
            if atom.resolution.is_pending() {
                tracing::debug!("{atom} is not generated yet");
            }
            if atom.is_empty() || target.iter().any(|a| a.as_str() == atom.as_str()) {
                continue;
            }
            target.push(atom);
        }

        groups.features.retain(|block| !block.atoms.is_empty());
        groups
    }

    /// USE flags declared by the feature blocks, in block order.
    pub fn flags(&self) -> Vec<UseFlag> {
        self.features.iter().map(|b| b.flag.clone()).collect()
    }

    /// `true` when there is nothing to put in `RDEPEND`.
    pub fn is_empty(&self) -> bool {
        self.unconditional.is_empty() && self.features.is_empty()
    }

    /// Every atom, unconditional first.
    pub fn atoms(&self) -> impl Iterator<Item = &ResolvedAtom> {
        self.unconditional
            .iter()
            .chain(self.features.iter().flat_map(|b| b.atoms.iter()))
    }
}

/// Renders the body of `RDEPEND="..."`: one tab-indented line per atom, a
/// one-line `flag? ( atom )` for single-atom blocks and a nested block
/// otherwise.
impl fmt::Display for RequirementGroups {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for atom in &self.unconditional {
            writeln!(f, "\t{atom}")?;
        }
        for block in &self.features {
            match block.atoms.as_slice() {
                [atom] => writeln!(f, "\t{}? ( {atom} )", block.flag)?,
                atoms => {
                    writeln!(f, "\t{}? (", block.flag)?;
                    for atom in atoms {
                        writeln!(f, "\t\t{atom}")?;
                    }
                    writeln!(f, "\t)")?;
                }
            }
        }
        Ok(())
    }
}
