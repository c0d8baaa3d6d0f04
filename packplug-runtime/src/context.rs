//! In-process context handed to plugin authors for one action (spec §4.F
//! step 5: "construct an in-process context (package, workDir,
//! builtProductsDir, tool map)").

use crate::error::RuntimeError;
use camino::Utf8PathBuf;
use packplug_wire::{Input, Package, Target};
use std::collections::BTreeMap;

pub struct PluginContext<'a> {
    input: &'a Input,
    pub work_dir: Utf8PathBuf,
    pub built_products_dir: Utf8PathBuf,
    pub tools: BTreeMap<String, Utf8PathBuf>,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(input: &'a Input) -> Self {
        let path_string = |id: packplug_wire::PathId| resolve_path(input, id);
        let work_dir = path_string(input.plugin_work_dir);
        let built_products_dir = path_string(input.built_products_dir);
        let tools = input
            .tool_names_to_paths
            .iter()
            .map(|(name, id)| (name.clone(), path_string(*id)))
            .collect();
        Self {
            input,
            work_dir,
            built_products_dir,
            tools,
        }
    }

    pub fn package(&self) -> &Package {
        &self.input.packages[self.input.root_package.index()]
    }

    pub fn target(&self, id: packplug_wire::TargetId) -> &Target {
        &self.input.targets[id.index()]
    }

    /// Resolves a tool by the name it was vended under (spec §4.E "tool
    /// map"). Prefer this over indexing `tools` directly: an unresolved
    /// name is a plugin-author mistake the host should see as a named
    /// error, not a panic.
    pub fn tool(&self, name: &str) -> Result<&Utf8PathBuf, RuntimeError> {
        self.tools
            .get(name)
            .ok_or_else(|| RuntimeError::ToolNotFound(name.to_string()))
    }
}

fn resolve_path(input: &Input, id: packplug_wire::PathId) -> Utf8PathBuf {
    let record = &input.paths[id.index()];
    let mut full = match record.base {
        None => Utf8PathBuf::new(),
        Some(base_id) => resolve_path(input, base_id),
    };
    full.push(&record.subpath);
    full
}
