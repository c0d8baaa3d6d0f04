//! In-memory package graph: the DAG of packages, products, and targets that
//! the serializer (`crate::serialize`) flattens into `packplug_wire::Input`.
//!
//! This is the "supplied by manifest parsing" collaborator spec.md §1 calls
//! out of scope; it exists here in a minimal, construction-friendly form so
//! the serializer has a concrete input to operate on and so tests can build
//! graphs by hand (spec §8 determinism/dedup properties).
//!
//! Nodes are `Arc`-shared: the same target may be reachable from several
//! dependency edges, and identity (not structural equality) is what the
//! serializer must deduplicate on (spec §4.B).

use camino::Utf8PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct PackageNode(pub(crate) Arc<PackageData>);

pub struct PackageData {
    pub name: String,
    pub directory: Utf8PathBuf,
    pub dependencies: Vec<PackageNode>,
    pub products: Vec<ProductNode>,
    pub targets: Vec<TargetNode>,
}

impl PackageNode {
    pub fn new(data: PackageData) -> Self {
        Self(Arc::new(data))
    }

    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl std::ops::Deref for PackageNode {
    type Target = PackageData;
    fn deref(&self) -> &PackageData {
        &self.0
    }
}

#[derive(Clone)]
pub struct ProductNode(pub(crate) Arc<ProductData>);

pub struct ProductData {
    pub name: String,
    pub targets: Vec<TargetNode>,
    pub kind: ProductKind,
}

pub enum ProductKind {
    Executable { main_target: TargetNode },
    Library { kind: LibraryKind },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LibraryKind {
    Static,
    Dynamic,
    Automatic,
}

impl ProductNode {
    pub fn new(data: ProductData) -> Self {
        Self(Arc::new(data))
    }

    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl std::ops::Deref for ProductNode {
    type Target = ProductData;
    fn deref(&self) -> &ProductData {
        &self.0
    }
}

#[derive(Clone)]
pub struct TargetNode(pub(crate) Arc<TargetData>);

pub struct TargetData {
    pub name: String,
    pub directory: Utf8PathBuf,
    pub dependencies: Vec<TargetDependency>,
    pub kind: TargetKind,
}

#[derive(Clone)]
pub enum TargetDependency {
    Target(TargetNode),
    Product(ProductNode),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TargetRole {
    Library,
    Executable,
}

pub struct CodeTarget {
    pub module_name: String,
    pub public_headers_dir: Option<Utf8PathBuf>,
    pub sources: Vec<Utf8PathBuf>,
    pub resources: Vec<Utf8PathBuf>,
    pub other_files: Vec<Utf8PathBuf>,
    pub role: TargetRole,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PluginCapability {
    BuildTool,
    UserCommand,
}

/// The category a target belongs to. `Plugin` is the "unsupported kind"
/// spec §4.B refers to: it has no wire `TargetInfo` representation and is
/// never assigned a [`packplug_wire::TargetId`] by the serializer.
pub enum TargetKind {
    Code(CodeTarget),
    BinaryLibrary { path: Utf8PathBuf },
    SystemLibrary { public_headers_dir: Utf8PathBuf },
    Plugin {
        plugin_name: String,
        capability: PluginCapability,
        sources: Vec<Utf8PathBuf>,
    },
}

impl TargetNode {
    pub fn new(data: TargetData) -> Self {
        Self(Arc::new(data))
    }

    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn is_plugin(&self) -> bool {
        matches!(self.kind, TargetKind::Plugin { .. })
    }
}

impl std::ops::Deref for TargetNode {
    type Target = TargetData;
    fn deref(&self) -> &TargetData {
        &self.0
    }
}
