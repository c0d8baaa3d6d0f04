//! In-memory package/product/target graph and its flattening into the wire
//! `Input` a plugin invocation consumes (spec §3, §4.B).

pub mod model;
pub mod serializer;

pub use model::{
    CodeTarget, LibraryKind, PackageData, PackageNode, PluginCapability, ProductData,
    ProductKind, ProductNode, TargetData, TargetDependency, TargetKind, TargetNode, TargetRole,
};
pub use serializer::{serialize, ActionRequest, GraphError};
