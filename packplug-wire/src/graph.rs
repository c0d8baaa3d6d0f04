//! The flattened, ID-based package graph handed to a plugin (spec §3 "Wire graph").

use crate::ids::{PackageId, PathId, ProductId, TargetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A path relative to another path record, or rooted if `base` is absent.
///
/// The same absolute path always maps to the same [`PathId`]; shared
/// prefixes (directories) are deduplicated by the serializer (spec §4.B).
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Path {
    pub base: Option<PathId>,
    pub subpath: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Source,
    Header,
    Resource,
    Unknown,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct File {
    pub base: PathId,
    pub name: String,
    pub kind: FileKind,
}

/// A target's dependency: either another target in the graph, or a product
/// (e.g. a library product assembled from several targets).
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Dependency {
    TargetDep { target: TargetId },
    ProductDep { product: ProductId },
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TargetInfo {
    SourceModule {
        module_name: String,
        public_headers_dir: Option<PathId>,
        files: Vec<File>,
    },
    BinaryLibrary {
        path: PathId,
    },
    SystemLibrary {
        public_headers_dir: PathId,
    },
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Target {
    pub name: String,
    pub directory: PathId,
    pub deps: Vec<Dependency>,
    pub info: TargetInfo,
}

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    Static,
    Dynamic,
    Automatic,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProductInfo {
    Executable { main_target: TargetId },
    Library { kind: LibraryKind },
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Product {
    pub name: String,
    pub targets: Vec<TargetId>,
    pub info: ProductInfo,
}

#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Package {
    pub name: String,
    pub directory: PathId,
    pub dependencies: Vec<PackageId>,
    pub products: Vec<ProductId>,
    pub targets: Vec<TargetId>,
}

/// The action the host is requesting of the plugin (spec §3 "Action").
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    CreateBuildToolCommands { target: TargetId },
    PerformUserCommand {
        targets: Vec<TargetId>,
        arguments: Vec<String>,
    },
}

/// The complete flattened input for one plugin invocation (spec §3 "Input").
///
/// Every ID embedded anywhere in this structure is valid only against the
/// arrays carried alongside it — it is never valid across two different
/// `Input` values, even for the same underlying package graph, unless the
/// serializer that produced them made identical traversal decisions (see
/// the determinism property in spec §8.1).
///
/// Field names on the wire follow spec §6 ("Input JSON"), the section that
/// governs the actual bytes exchanged, rather than the abbreviated names
/// used in §3's prose summary of the same structure (`rootPackage` vs.
/// `rootPackageId`, etc.) — the two sections disagree and §6 wins because
/// it is the one a decoder on the other side of the pipe must match byte
/// for byte.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub paths: Vec<Path>,
    pub targets: Vec<Target>,
    pub products: Vec<Product>,
    pub packages: Vec<Package>,
    #[serde(rename = "rootPackageId")]
    pub root_package: PackageId,
    #[serde(rename = "pluginWorkDirId")]
    pub plugin_work_dir: PathId,
    #[serde(rename = "builtProductsDirId")]
    pub built_products_dir: PathId,
    #[serde(rename = "toolNamesToPathIds")]
    pub tool_names_to_paths: BTreeMap<String, PathId>,
    #[serde(rename = "pluginAction")]
    pub action: Action,
}
