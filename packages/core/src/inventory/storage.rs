//! Node inventory storage
//!
//! Load and save nodes.json.

use std::fs;
use std::path::Path;

use super::error::InventoryError;
use super::schema::NodesFile;
use crate::config::paths::get_nodes_path;

/// Load `~/.config/labhost/nodes.json`; empty if it doesn't exist
pub fn load_nodes() -> Result<NodesFile, InventoryError> {
    let path = get_nodes_path().ok_or(InventoryError::NoPath)?;
    load_nodes_from(&path)
}

/// Save `~/.config/labhost/nodes.json`
pub fn save_nodes(nodes: &NodesFile) -> Result<(), InventoryError> {
    let path = get_nodes_path().ok_or(InventoryError::NoPath)?;
    save_nodes_to(nodes, &path)
}

pub fn load_nodes_from(path: &Path) -> Result<NodesFile, InventoryError> {
    if !path.exists() {
        tracing::debug!("Nodes file not found, returning empty: {}", path.display());
        return Ok(NodesFile::new());
    }

    let contents = fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let nodes: NodesFile =
        serde_json::from_str(&contents).map_err(|source| InventoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!("Loaded {} nodes from {}", nodes.nodes.len(), path.display());
    Ok(nodes)
}

/// Write `nodes` to `path`, keeping the previous file as `.json.bak`
pub fn save_nodes_to(nodes: &NodesFile, path: &Path) -> Result<(), InventoryError> {
    let io_error = |source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }

    if path.exists() {
        let backup_path = path.with_extension("json.bak");
        fs::copy(path, &backup_path).map_err(io_error)?;
        tracing::debug!("Created nodes backup: {}", backup_path.display());
    }

    let json = serde_json::to_string_pretty(nodes).map_err(InventoryError::Serialize)?;
    fs::write(path, json).map_err(io_error)?;

    tracing::debug!("Saved {} nodes to {}", nodes.nodes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::NodeConfig;

    #[test]
    fn missing_file_is_empty_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = load_nodes_from(&dir.path().join("nodes.json")).unwrap();
        assert!(nodes.nodes.is_empty());
    }

    #[test]
    fn save_then_load_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab").join("nodes.json");

        let mut nodes = NodesFile::new();
        nodes.add_node("n1", NodeConfig::new("10.0.0.5"));
        save_nodes_to(&nodes, &path).unwrap();

        nodes.add_node("n2", NodeConfig::new("10.0.0.6"));
        save_nodes_to(&nodes, &path).unwrap();

        let loaded = load_nodes_from(&path).unwrap();
        assert_eq!(loaded.node_names(), vec!["n1", "n2"]);

        let backup = load_nodes_from(&path.with_extension("json.bak")).unwrap();
        assert_eq!(backup.node_names(), vec!["n1"]);
    }

    #[test]
    fn corrupt_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_nodes_from(&path).unwrap_err();
        assert!(matches!(err, InventoryError::Parse { .. }));
        assert!(err.to_string().contains("nodes.json"));
    }
}
