//! Resolves the tool names accessible to a plugin invocation to absolute
//! paths (spec §4.E "Determine accessible tools").
//!
//! A binary-target dependency stands in for a prebuilt "vended" tool,
//! distributed as a `.tar.gz` artifact archive with one top-level directory
//! per supported host triple. An executable-target dependency stands in for
//! a "built" tool produced earlier in the same build (spec §4.E: "already
//! absolute" vs. "appended to the builtProductsDir").

use crate::error::SessionError;
use camino::{Utf8Path, Utf8PathBuf};

/// Extracts the host-triple-specific executable from a vended tool's
/// artifact archive into `extract_root`, returning its absolute path.
/// Idempotent: a prior extraction for the same tool is reused.
pub fn resolve_vended_tool(
    archive_path: &Utf8Path,
    tool_name: &str,
    host_triple: &str,
    extract_root: &Utf8Path,
) -> Result<Utf8PathBuf, SessionError> {
    let dest_dir = extract_root.join(tool_name);
    let dest_path = dest_dir.join(tool_name);
    if dest_path.is_file() {
        return Ok(dest_path);
    }
    std::fs::create_dir_all(&dest_dir).map_err(|source| SessionError::WorkDirCreation {
        path: dest_dir.clone(),
        source,
    })?;

    let file = std::fs::File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let matches_triple = entry_path
            .components()
            .any(|c| c.as_os_str() == host_triple);
        if matches_triple && entry.header().entry_type().is_file() {
            entry.unpack(&dest_path)?;
            return Ok(dest_path);
        }
    }
    Err(SessionError::ToolNotVendedForHost {
        archive: archive_path.to_owned(),
        host_triple: host_triple.to_string(),
    })
}

/// A built tool's path is simply its relative location promoted to
/// absolute against the build's product directory (spec §4.E).
pub fn resolve_built_tool(built_products_dir: &Utf8Path, relative_path: &Utf8Path) -> Utf8PathBuf {
    built_products_dir.join(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tool_archive(dir: &Utf8Path, triple: &str, tool_name: &str, contents: &[u8]) -> Utf8PathBuf {
        let archive_path = dir.join("tool.tar.gz");
        let file = std::fs::File::create(&archive_path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{triple}/{tool_name}"), contents)
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        let mut f = std::fs::OpenOptions::new().append(true).open(&archive_path).unwrap();
        f.write_all(&[]).unwrap();
        archive_path
    }

    #[test]
    fn extracts_matching_triple_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let archive = write_tool_archive(dir, "x86_64-unknown-linux-gnu", "protoc", b"#!/bin/sh\necho hi\n");
        let extract_root = dir.join("extract");

        let path = resolve_vended_tool(&archive, "protoc", "x86_64-unknown-linux-gnu", &extract_root).unwrap();
        assert!(path.exists());
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"#!/bin/sh\necho hi\n");

        let path2 = resolve_vended_tool(&archive, "protoc", "x86_64-unknown-linux-gnu", &extract_root).unwrap();
        assert_eq!(path, path2);
    }

    #[test]
    fn missing_triple_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let archive = write_tool_archive(dir, "aarch64-apple-darwin", "protoc", b"binary");
        let extract_root = dir.join("extract");

        let err = resolve_vended_tool(&archive, "protoc", "x86_64-unknown-linux-gnu", &extract_root)
            .unwrap_err();
        assert!(matches!(err, SessionError::ToolNotVendedForHost { .. }));
    }

    #[test]
    fn built_tool_path_is_promoted_to_absolute() {
        let built_products_dir = Utf8Path::new("/ws/.build/debug");
        let path = resolve_built_tool(built_products_dir, Utf8Path::new("my-tool"));
        assert_eq!(path, Utf8PathBuf::from("/ws/.build/debug/my-tool"));
    }
}
