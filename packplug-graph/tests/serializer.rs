use camino::Utf8PathBuf;
use packplug_graph::{
    serialize, ActionRequest, CodeTarget, LibraryKind, PackageData, PackageNode, PluginCapability,
    ProductData, ProductKind, ProductNode, TargetData, TargetDependency, TargetKind, TargetNode,
    TargetRole,
};
use packplug_wire::{Action, Dependency, FileKind, ProductInfo, TargetInfo};
use std::collections::BTreeMap;

fn p(s: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(s)
}

/// Builds: package `app` at `/ws/app` with
///   lib_a  (library, /ws/app/Sources/LibA)
///   lib_b  (library, /ws/app/Sources/LibB, depends on lib_a, and on a plugin
///           target that has no wire representation)
///   exe    (executable, /ws/app/Sources/Exe, depends on lib_b)
/// products: `App` (executable, main target = exe), `LibB` (automatic library)
fn sample_graph() -> (PackageNode, TargetNode, TargetNode, TargetNode) {
    let lib_a = TargetNode::new(TargetData {
        name: "LibA".into(),
        directory: p("/ws/app/Sources/LibA"),
        dependencies: vec![],
        kind: TargetKind::Code(CodeTarget {
            module_name: "LibA".into(),
            public_headers_dir: None,
            sources: vec![p("/ws/app/Sources/LibA/a.swift"), p("/ws/app/Sources/LibA/b.swift")],
            resources: vec![],
            other_files: vec![],
            role: TargetRole::Library,
        }),
    });

    let generator = TargetNode::new(TargetData {
        name: "Generator".into(),
        directory: p("/ws/app/Plugins/Generator"),
        dependencies: vec![],
        kind: TargetKind::Plugin {
            plugin_name: "Generator".into(),
            capability: PluginCapability::BuildTool,
            sources: vec![p("/ws/app/Plugins/Generator/plugin.swift")],
        },
    });

    let lib_b = TargetNode::new(TargetData {
        name: "LibB".into(),
        directory: p("/ws/app/Sources/LibB"),
        dependencies: vec![
            TargetDependency::Target(lib_a.clone()),
            TargetDependency::Target(generator.clone()),
        ],
        kind: TargetKind::Code(CodeTarget {
            module_name: "LibB".into(),
            public_headers_dir: None,
            sources: vec![p("/ws/app/Sources/LibB/c.swift")],
            resources: vec![p("/ws/app/Sources/LibB/data.json")],
            other_files: vec![],
            role: TargetRole::Library,
        }),
    });

    let lib_b_product = ProductNode::new(ProductData {
        name: "LibB".into(),
        targets: vec![lib_b.clone()],
        kind: ProductKind::Library {
            kind: LibraryKind::Automatic,
        },
    });

    let exe = TargetNode::new(TargetData {
        name: "Exe".into(),
        directory: p("/ws/app/Sources/Exe"),
        dependencies: vec![
            TargetDependency::Target(lib_b.clone()),
            TargetDependency::Product(lib_b_product.clone()),
        ],
        kind: TargetKind::Code(CodeTarget {
            module_name: "Exe".into(),
            public_headers_dir: None,
            sources: vec![p("/ws/app/Sources/Exe/main.swift")],
            resources: vec![],
            other_files: vec![],
            role: TargetRole::Executable,
        }),
    });

    let app_product = ProductNode::new(ProductData {
        name: "App".into(),
        targets: vec![exe.clone()],
        kind: ProductKind::Executable {
            main_target: exe.clone(),
        },
    });

    let root = PackageNode::new(PackageData {
        name: "app".into(),
        directory: p("/ws/app"),
        dependencies: vec![],
        products: vec![app_product, lib_b_product],
        targets: vec![lib_a.clone(), generator, lib_b.clone(), exe.clone()],
    });

    (root, lib_a, lib_b, exe)
}

#[test]
fn determinism_byte_for_byte() {
    let (root, _, _, exe) = sample_graph();
    let input1 = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe.clone() },
    )
    .unwrap();
    let input2 = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe },
    )
    .unwrap();
    let json1 = serde_json::to_vec(&input1).unwrap();
    let json2 = serde_json::to_vec(&input2).unwrap();
    assert_eq!(json1, json2);
}

#[test]
fn path_dedup_shares_common_ancestor() {
    let (root, _, _, exe) = sample_graph();
    let input = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe },
    )
    .unwrap();

    let sources_records: Vec<_> = input
        .paths
        .iter()
        .enumerate()
        .filter(|(_, p)| p.subpath == "Sources")
        .collect();
    assert_eq!(
        sources_records.len(),
        1,
        "expected exactly one Path record for the shared `Sources` ancestor, got {:?}",
        sources_records
    );

    // Every distinct absolute path referenced gets exactly one record: no duplicates by subpath+base.
    let mut seen = std::collections::HashSet::new();
    for path in &input.paths {
        assert!(seen.insert((path.base, path.subpath.clone())), "duplicate path record: {path:?}");
    }
}

#[test]
fn plugin_dependency_is_dropped_not_faked() {
    let (root, _, lib_b, exe) = sample_graph();
    let input = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe },
    )
    .unwrap();

    // lib_b's wire Target must not reference the plugin target id at all.
    let lib_b_wire = input
        .targets
        .iter()
        .find(|t| t.name == lib_b.name)
        .expect("lib_b serialized");
    assert_eq!(lib_b_wire.deps.len(), 1);
    assert!(matches!(lib_b_wire.deps[0], Dependency::TargetDep { .. }));

    // The plugin target itself never received an id: target count excludes it.
    assert_eq!(input.targets.len(), 3, "LibA, LibB, Exe only");
}

#[test]
fn round_trip_preserves_target_projection() {
    let (root, _, _, exe) = sample_graph();
    let input = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe },
    )
    .unwrap();

    let encoded = serde_json::to_vec(&input).unwrap();
    let decoded: packplug_wire::Input = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(input, decoded);

    let exe_wire = decoded
        .targets
        .iter()
        .find(|t| t.name == "Exe")
        .expect("exe present");
    match &exe_wire.info {
        TargetInfo::SourceModule { files, .. } => {
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].kind, FileKind::Source);
        }
        other => panic!("unexpected target info: {other:?}"),
    }
}

#[test]
fn executable_product_requires_exactly_one_executable_target() {
    let extra_exe = TargetNode::new(TargetData {
        name: "Exe2".into(),
        directory: p("/ws/app/Sources/Exe2"),
        dependencies: vec![],
        kind: TargetKind::Code(CodeTarget {
            module_name: "Exe2".into(),
            public_headers_dir: None,
            sources: vec![p("/ws/app/Sources/Exe2/main.swift")],
            resources: vec![],
            other_files: vec![],
            role: TargetRole::Executable,
        }),
    });
    let exe1 = TargetNode::new(TargetData {
        name: "Exe1".into(),
        directory: p("/ws/app/Sources/Exe1"),
        dependencies: vec![],
        kind: TargetKind::Code(CodeTarget {
            module_name: "Exe1".into(),
            public_headers_dir: None,
            sources: vec![p("/ws/app/Sources/Exe1/main.swift")],
            resources: vec![],
            other_files: vec![],
            role: TargetRole::Executable,
        }),
    });
    let product = ProductNode::new(ProductData {
        name: "Ambiguous".into(),
        targets: vec![exe1.clone(), extra_exe],
        kind: ProductKind::Executable { main_target: exe1.clone() },
    });
    let root = PackageNode::new(PackageData {
        name: "app".into(),
        directory: p("/ws/app"),
        dependencies: vec![],
        products: vec![product],
        targets: vec![exe1.clone()],
    });

    let err = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe1 },
    )
    .unwrap_err();
    assert!(matches!(err, packplug_graph::GraphError::AmbiguousMainTarget { .. }));
}

#[test]
fn product_wire_info_matches() {
    let (root, _, _, exe) = sample_graph();
    let input = serialize(
        &root,
        &p("/ws/work"),
        &p("/ws/build"),
        &BTreeMap::new(),
        ActionRequest::CreateBuildToolCommands { target: exe },
    )
    .unwrap();
    let app = input.products.iter().find(|p| p.name == "App").unwrap();
    match &app.info {
        ProductInfo::Executable { main_target } => {
            let t = &input.targets[main_target.index()];
            assert_eq!(t.name, "Exe");
        }
        other => panic!("unexpected: {other:?}"),
    }
    match &input.action {
        Action::CreateBuildToolCommands { target } => {
            assert_eq!(input.targets[target.index()].name, "Exe");
        }
        other => panic!("unexpected action: {other:?}"),
    }
}
