//! Depth-first, identity-memoizing flattening of a [`crate::model`] graph
//! into a [`packplug_wire::Input`] (spec §4.B).

use crate::model::{
    CodeTarget, PackageNode, ProductKind, ProductNode, TargetDependency, TargetKind, TargetNode,
    TargetRole,
};
use camino::{Utf8Path, Utf8PathBuf};
use packplug_wire::{
    Action, Dependency, File, FileKind, Input, LibraryKind as WireLibraryKind, Package, PackageId,
    Path as WirePath, PathId, Product, ProductId, ProductInfo, Target, TargetId, TargetInfo,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// What the host wants the plugin to do, expressed against in-memory nodes;
/// `serialize` resolves these to wire [`TargetId`]s.
pub enum ActionRequest {
    CreateBuildToolCommands {
        target: TargetNode,
    },
    PerformUserCommand {
        targets: Vec<TargetNode>,
        arguments: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("cycle detected in package graph while visiting `{0}`")]
    Cycle(String),
    #[error(
        "product `{product}` must have exactly one executable target, found {found}"
    )]
    AmbiguousMainTarget { product: String, found: usize },
    #[error("target `{0}` is not serializable and was required by the requested action")]
    RequiredTargetNotSerializable(String),
}

/// Flattens `root_package` and everything reachable from it into a single
/// [`Input`] for one plugin invocation requesting `action`.
pub fn serialize(
    root_package: &PackageNode,
    plugin_work_dir: &Utf8Path,
    built_products_dir: &Utf8Path,
    tool_paths: &BTreeMap<String, Utf8PathBuf>,
    action: ActionRequest,
) -> Result<Input, GraphError> {
    let mut ser = Serializer::default();
    let root_package_id = ser.package_id(root_package)?;
    let plugin_work_dir = ser.path_id(plugin_work_dir);
    let built_products_dir = ser.path_id(built_products_dir);
    let tool_names_to_paths = tool_paths
        .iter()
        .map(|(name, path)| (name.clone(), ser.path_id(path)))
        .collect();

    let action = match action {
        ActionRequest::CreateBuildToolCommands { target } => {
            let name = target.name.clone();
            let target = ser
                .target_id(&target)?
                .ok_or(GraphError::RequiredTargetNotSerializable(name))?;
            Action::CreateBuildToolCommands { target }
        }
        ActionRequest::PerformUserCommand { targets, arguments } => {
            let mut ids = Vec::with_capacity(targets.len());
            for target in &targets {
                let name = target.name.clone();
                let id = ser
                    .target_id(target)?
                    .ok_or(GraphError::RequiredTargetNotSerializable(name))?;
                ids.push(id);
            }
            Action::PerformUserCommand {
                targets: ids,
                arguments,
            }
        }
    };

    Ok(Input {
        paths: ser.paths,
        targets: ser.targets,
        products: ser.products,
        packages: ser.packages,
        root_package: root_package_id,
        plugin_work_dir,
        built_products_dir,
        tool_names_to_paths,
        action,
    })
}

#[derive(Default)]
struct Serializer {
    paths: Vec<WirePath>,
    path_ids: HashMap<String, PathId>,

    targets: Vec<Target>,
    target_done: HashMap<usize, Option<TargetId>>,
    target_in_progress: HashSet<usize>,

    products: Vec<Product>,
    product_done: HashMap<usize, ProductId>,
    product_in_progress: HashSet<usize>,

    packages: Vec<Package>,
    package_done: HashMap<usize, PackageId>,
    package_in_progress: HashSet<usize>,
}

impl Serializer {
    fn path_id(&mut self, path: &Utf8Path) -> PathId {
        let key = path.to_string();
        if let Some(id) = self.path_ids.get(&key) {
            return *id;
        }
        let record = match path.parent() {
            Some(parent) => {
                let base = self.path_id(parent);
                let subpath = path
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| path.as_str().to_string());
                WirePath {
                    base: Some(base),
                    subpath,
                }
            }
            None => WirePath {
                base: None,
                subpath: path.to_string(),
            },
        };
        let id = PathId(self.paths.len() as u32);
        self.paths.push(record);
        self.path_ids.insert(key, id);
        id
    }

    fn file(&mut self, path: &Utf8Path, kind: FileKind) -> File {
        let parent = path.parent().unwrap_or(path);
        let base = self.path_id(parent);
        let name = path
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| path.as_str().to_string());
        File { base, name, kind }
    }

    /// Returns `None` for target categories with no wire representation
    /// (plugin targets): spec §4.B "unsupported categories yield 'not
    /// serialized' (ID absent)".
    fn target_id(&mut self, target: &TargetNode) -> Result<Option<TargetId>, GraphError> {
        let identity = target.identity();
        if let Some(done) = self.target_done.get(&identity) {
            return Ok(*done);
        }
        if !self.target_in_progress.insert(identity) {
            return Err(GraphError::Cycle(target.name.clone()));
        }

        let result = self.build_target(target);
        self.target_in_progress.remove(&identity);

        let id = result?;
        self.target_done.insert(identity, id);
        Ok(id)
    }

    fn build_target(&mut self, target: &TargetNode) -> Result<Option<TargetId>, GraphError> {
        let info = match &target.kind {
            TargetKind::Plugin { .. } => return Ok(None),
            TargetKind::Code(code) => self.code_target_info(code)?,
            TargetKind::BinaryLibrary { path } => TargetInfo::BinaryLibrary {
                path: self.path_id(path),
            },
            TargetKind::SystemLibrary {
                public_headers_dir,
            } => TargetInfo::SystemLibrary {
                public_headers_dir: self.path_id(public_headers_dir),
            },
        };

        let mut deps = Vec::with_capacity(target.dependencies.len());
        for dep in &target.dependencies {
            match dep {
                TargetDependency::Target(t) => {
                    if let Some(id) = self.target_id(t)? {
                        deps.push(Dependency::TargetDep { target: id });
                    }
                    // unsupported target dependency: dropped, not faked (spec §3).
                }
                TargetDependency::Product(p) => {
                    let id = self.product_id(p)?;
                    deps.push(Dependency::ProductDep { product: id });
                }
            }
        }

        let directory = self.path_id(&target.directory);
        let id = TargetId(self.targets.len() as u32);
        self.targets.push(Target {
            name: target.name.clone(),
            directory,
            deps,
            info,
        });
        Ok(Some(id))
    }

    fn code_target_info(&mut self, code: &CodeTarget) -> Result<TargetInfo, GraphError> {
        let mut files = Vec::with_capacity(code.sources.len() + code.resources.len() + code.other_files.len());
        for path in &code.sources {
            files.push(self.file(path, FileKind::Source));
        }
        for path in &code.resources {
            files.push(self.file(path, FileKind::Resource));
        }
        for path in &code.other_files {
            files.push(self.file(path, FileKind::Unknown));
        }
        let public_headers_dir = code.public_headers_dir.as_deref().map(|p| self.path_id(p));
        Ok(TargetInfo::SourceModule {
            module_name: code.module_name.clone(),
            public_headers_dir,
            files,
        })
    }

    fn product_id(&mut self, product: &ProductNode) -> Result<ProductId, GraphError> {
        let identity = product.identity();
        if let Some(id) = self.product_done.get(&identity) {
            return Ok(*id);
        }
        if !self.product_in_progress.insert(identity) {
            return Err(GraphError::Cycle(product.name.clone()));
        }

        let result = self.build_product(product);
        self.product_in_progress.remove(&identity);

        let id = result?;
        self.product_done.insert(identity, id);
        Ok(id)
    }

    fn build_product(&mut self, product: &ProductNode) -> Result<ProductId, GraphError> {
        let mut target_ids = Vec::with_capacity(product.targets.len());
        for target in &product.targets {
            if let Some(id) = self.target_id(target)? {
                target_ids.push(id);
            }
        }

        let info = match &product.kind {
            ProductKind::Library { kind } => ProductInfo::Library {
                kind: match kind {
                    crate::model::LibraryKind::Static => WireLibraryKind::Static,
                    crate::model::LibraryKind::Dynamic => WireLibraryKind::Dynamic,
                    crate::model::LibraryKind::Automatic => WireLibraryKind::Automatic,
                },
            },
            ProductKind::Executable { main_target } => {
                let executables: Vec<_> = product
                    .targets
                    .iter()
                    .filter(|t| is_executable_role(t))
                    .collect();
                if executables.len() != 1 {
                    return Err(GraphError::AmbiguousMainTarget {
                        product: product.name.clone(),
                        found: executables.len(),
                    });
                }
                debug_assert!(executables[0].identity() == main_target.identity());
                let id = self
                    .target_id(main_target)?
                    .ok_or_else(|| GraphError::RequiredTargetNotSerializable(main_target.name.clone()))?;
                ProductInfo::Executable { main_target: id }
            }
        };

        let id = ProductId(self.products.len() as u32);
        self.products.push(Product {
            name: product.name.clone(),
            targets: target_ids,
            info,
        });
        Ok(id)
    }

    fn package_id(&mut self, package: &PackageNode) -> Result<PackageId, GraphError> {
        let identity = package.identity();
        if let Some(id) = self.package_done.get(&identity) {
            return Ok(*id);
        }
        if !self.package_in_progress.insert(identity) {
            return Err(GraphError::Cycle(package.name.clone()));
        }

        let result = self.build_package(package);
        self.package_in_progress.remove(&identity);

        let id = result?;
        self.package_done.insert(identity, id);
        Ok(id)
    }

    fn build_package(&mut self, package: &PackageNode) -> Result<PackageId, GraphError> {
        let mut dependencies = Vec::with_capacity(package.dependencies.len());
        for dep in &package.dependencies {
            dependencies.push(self.package_id(dep)?);
        }

        let mut products = Vec::with_capacity(package.products.len());
        for product in &package.products {
            products.push(self.product_id(product)?);
        }

        let mut targets = Vec::with_capacity(package.targets.len());
        for target in &package.targets {
            if let Some(id) = self.target_id(target)? {
                targets.push(id);
            }
        }

        let directory = self.path_id(&package.directory);
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            name: package.name.clone(),
            directory,
            dependencies,
            products,
            targets,
        });
        Ok(id)
    }
}

fn is_executable_role(target: &TargetNode) -> bool {
    matches!(
        &target.kind,
        TargetKind::Code(CodeTarget {
            role: TargetRole::Executable,
            ..
        })
    )
}
