//! The on-disk ebuild repository: what exists and where new ebuilds go.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::closure::DescriptorSink;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};

/// Contents of `metadata/layout.conf` for a new repository.
const LAYOUT_CONF: &str = "masters = gentoo\nthin-manifests = true\nsign-manifests = false\n";

/// List the package directories of `category` in the tree at `tree`.
///
/// A tree or category that does not exist has no packages.
pub fn scan_packages(tree: &Path, category: &str) -> Result<BTreeSet<String>> {
    let dir = tree.join(category);
    let scan_err = |e: io::Error| Error::Scan {
        path: dir.clone(),
        message: e.to_string(),
    };

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist", dir.display());
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(scan_err(e)),
    };

    let mut packages = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(scan_err)?;
        if !entry.file_type().map_err(scan_err)?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            packages.insert(name);
        }
    }
    Ok(packages)
}

/// Package names of `category` across several trees.
pub fn known_packages<'a, I>(trees: I, category: &str) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut known = BTreeSet::new();
    for tree in trees {
        let found = scan_packages(tree, category)?;
        tracing::debug!("{} packages in {}", found.len(), tree.display());
        known.extend(found);
    }
    Ok(known)
}

/// An overlay repository that generated ebuilds are written into.
///
/// The first write also creates `profiles/repo_name` and
/// `metadata/layout.conf` unless they already exist.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    manifest: bool,
    initialized: bool,
}

impl Repository {
    /// Repository rooted at `root`, which need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Repository {
            root: root.into(),
            manifest: false,
            initialized: false,
        }
    }

    /// Run `ebuild <file> manifest` after every write.
    pub fn with_manifest(mut self, manifest: bool) -> Self {
        self.manifest = manifest;
        self
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name written to `profiles/repo_name`: the root directory's name.
    pub fn name(&self) -> String {
        self.root
            .canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(&self.root)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty() && n != "..")
            .unwrap_or_else(|| "localrepo".to_string())
    }

    /// Path of the ebuild for `descriptor`.
    pub fn ebuild_path(&self, descriptor: &Descriptor) -> PathBuf {
        self.root
            .join(&descriptor.category)
            .join(&descriptor.package)
            .join(descriptor.file_name())
    }

    fn write_metadata(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let repo_name = self.root.join("profiles").join("repo_name");
        if !repo_name.exists() {
            write_file(&repo_name, &format!("{}\n", self.name()))?;
        }
        let layout = self.root.join("metadata").join("layout.conf");
        if !layout.exists() {
            write_file(&layout, LAYOUT_CONF)?;
        }
        self.initialized = true;
        Ok(())
    }

    fn run_manifest(&self, ebuild: &Path) {
        let dir = ebuild.parent().unwrap_or(&self.root);
        match Command::new("ebuild")
            .arg(ebuild)
            .arg("manifest")
            .current_dir(dir)
            .status()
        {
            Ok(status) if status.success() => {
                tracing::debug!("manifest updated for {}", ebuild.display())
            }
            Ok(status) => tracing::warn!(
                "ebuild manifest for {} exited with {status}",
                ebuild.display()
            ),
            Err(e) => tracing::warn!("cannot run ebuild manifest for {}: {e}", ebuild.display()),
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| Error::write(path, e))
}

impl DescriptorSink for Repository {
    fn emit(&mut self, descriptor: &Descriptor) -> Result<()> {
        self.write_metadata()?;
        let path = self.ebuild_path(descriptor);
        write_file(&path, &descriptor.to_string())?;
        tracing::debug!("wrote {}", path.display());
        if self.manifest {
            self.run_manifest(&path);
        }
        Ok(())
    }
}
