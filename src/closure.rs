//! Generating ebuilds for seed packages and, optionally, everything they
//! pull in that the repository does not have yet.

use std::collections::HashSet;

use crate::descriptor::{Descriptor, DescriptorOptions};
use crate::error::{Error, Result};
use crate::group::{RequirementGroups, RequirementPolicy};
use crate::provider::MetadataProvider;
use crate::resolver::{NameRegistry, NameResolver};

/// Destination of generated ebuilds.
pub trait DescriptorSink {
    /// Store one descriptor.
    fn emit(&mut self, descriptor: &Descriptor) -> Result<()>;
}

/// Collects descriptors in memory.
impl DescriptorSink for Vec<Descriptor> {
    fn emit(&mut self, descriptor: &Descriptor) -> Result<()> {
        self.push(descriptor.clone());
        Ok(())
    }
}

/// A package that could not be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Package name in the target category.
    pub package: String,
    /// Registry name it was fetched under.
    pub source: String,
    /// What went wrong.
    pub error: Error,
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// `category/name-version` of every ebuild written, in order.
    pub emitted: Vec<String>,
    /// Packages that failed, in order.
    pub failed: Vec<Failure>,
    /// Target names still missing from the repository after the run.
    pub unresolved: Vec<String>,
}

impl Report {
    /// `true` when no package failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives fetching, grouping, rendering and emitting.
pub struct Generator<P, S> {
    provider: P,
    sink: S,
    resolver: NameResolver,
    policy: RequirementPolicy,
    options: DescriptorOptions,
}

impl<P: MetadataProvider, S: DescriptorSink> Generator<P, S> {
    /// Create a generator.
    pub fn new(
        provider: P,
        sink: S,
        resolver: NameResolver,
        policy: RequirementPolicy,
        options: DescriptorOptions,
    ) -> Self {
        Generator {
            provider,
            sink,
            resolver,
            policy,
            options,
        }
    }

    /// The sink descriptors were emitted to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Generate ebuilds for `seeds` (registry names).
    ///
    /// With `recursive`, every name the generated ebuilds reference but
    /// `registry` does not know is generated too, repeating until nothing
    /// new turns up. Each target name is attempted at most once per run, so
    /// mutually dependent packages terminate. A failing package is reported
    /// and does not stop the others.
    pub fn run<I, T>(&mut self, seeds: I, recursive: bool, registry: &mut NameRegistry) -> Report
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut report = Report::default();
        let mut attempted = HashSet::new();

        for seed in seeds {
            self.process(seed.as_ref(), &mut attempted, registry, &mut report);
        }

        if recursive {
            loop {
                let pending: Vec<String> = registry
                    .missing()
                    .filter(|(target, _)| !attempted.contains(*target))
                    .map(|(_, source)| source.to_string())
                    .collect();
                if pending.is_empty() {
                    break;
                }
                tracing::debug!("{} missing packages to generate", pending.len());
                for source in pending {
                    self.process(&source, &mut attempted, registry, &mut report);
                }
            }
        }

        for failure in &report.failed {
            registry.forget_missing(&failure.package);
        }
        report.unresolved = registry.missing().map(|(target, _)| target.to_string()).collect();
        for name in &report.unresolved {
            tracing::warn!(
                "{}/{name} is still missing from the repository",
                self.resolver.category()
            );
        }
        report
    }

    fn process(
        &mut self,
        source: &str,
        attempted: &mut HashSet<String>,
        registry: &mut NameRegistry,
        report: &mut Report,
    ) {
        let package = self.resolver.target_name(source);
        if !attempted.insert(package.clone()) {
            tracing::debug!("{package} already attempted");
            return;
        }

        match self.generate(source, &package, registry) {
            Ok(cpv) => {
                tracing::info!("generated {cpv}");
                registry.mark_known(&package);
                report.emitted.push(cpv);
            }
            Err(error) => {
                tracing::warn!("{source}: {error}");
                registry.forget_missing(&package);
                report.failed.push(Failure {
                    package,
                    source: source.to_string(),
                    error,
                });
            }
        }
    }

    fn generate(
        &mut self,
        source: &str,
        package: &str,
        registry: &mut NameRegistry,
    ) -> Result<String> {
        let record = self.provider.fetch(source)?;
        let groups =
            RequirementGroups::build(&record.requires, &self.policy, &self.resolver, registry);
        let descriptor = Descriptor::render(package, &record, groups, &self.options);
        self.sink.emit(&descriptor)?;
        Ok(descriptor.cpv())
    }
}
