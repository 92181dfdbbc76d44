//! Area-adjacency declarations from TOML or JSON.

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use dopf_core::{AdjacencyDeclaration, AreaDeclaration};
use tracing::debug;

/// On-disk format of an adjacency declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyFormat {
    Toml,
    Json,
}

impl AdjacencyFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
            .with_context(|| format!("detecting format of {}", path.display()))
    }
}

impl FromStr for AdjacencyFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(AdjacencyFormat::Toml),
            "json" => Ok(AdjacencyFormat::Json),
            other => bail!("unsupported adjacency format '{other}' (expected toml or json)"),
        }
    }
}

/// Parse a declaration from text.
pub fn parse_adjacency(content: &str, format: AdjacencyFormat) -> Result<AdjacencyDeclaration> {
    let decl: AdjacencyDeclaration = match format {
        AdjacencyFormat::Toml => toml::from_str(content).context("parsing TOML adjacency")?,
        AdjacencyFormat::Json => serde_json::from_str(content).context("parsing JSON adjacency")?,
    };
    if decl.is_empty() {
        bail!("adjacency declaration lists no areas");
    }
    Ok(decl)
}

/// Load a declaration from a `.toml` or `.json` file.
pub fn load_adjacency(path: &Path) -> Result<AdjacencyDeclaration> {
    let format = AdjacencyFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading adjacency {}", path.display()))?;
    let decl = parse_adjacency(&content, format)
        .with_context(|| format!("loading adjacency {}", path.display()))?;
    debug!(path = %path.display(), areas = decl.len(), "loaded adjacency declaration");
    Ok(decl)
}

/// Four-area split of the reference feeder.
///
/// `area1` holds the substation (node 1) and feeds `area2` and `area3`
/// from node 4 over tie-lines `4 → 9` and `4 → 5`; `area3` feeds `area4`
/// over `6 → 10`.
pub fn four_area_feeder() -> AdjacencyDeclaration {
    AdjacencyDeclaration::new(vec![
        AreaDeclaration::root("area1", 1)
            .with_down("area2", "D12", 4)
            .with_down("area3", "D13", 4),
        AreaDeclaration::child("area2", "area1", "D21", 9),
        AreaDeclaration::child("area3", "area1", "D31", 5).with_down("area4", "D34", 6),
        AreaDeclaration::child("area4", "area3", "D43", 10),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dopf_core::NodeId;
    use tempfile::TempDir;

    const TWO_AREAS: &str = r#"
[[areas]]
name = "area1"
up_local_node = 1
up_global_node = 1

[[areas.down]]
area = "area2"
local_node = "D2"
global_node = 2

[[areas]]
name = "area2"
up_area = "area1"
up_local_node = "U3"
up_global_node = 3
"#;

    #[test]
    fn test_toml_declaration() {
        let decl = parse_adjacency(TWO_AREAS, AdjacencyFormat::Toml).unwrap();
        assert_eq!(decl.len(), 2);
        assert!(decl.areas[0].is_root());
        assert_eq!(decl.areas[0].down[0].global_node, NodeId::from(2));
        assert_eq!(decl.area("area2").unwrap().up_local_node, NodeId::from("U3"));
    }

    #[test]
    fn test_json_file_matches_builtin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("areas.json");
        std::fs::write(&path, serde_json::to_string(&four_area_feeder()).unwrap()).unwrap();
        assert_eq!(load_adjacency(&path).unwrap(), four_area_feeder());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("areas.yaml");
        std::fs::write(&path, "").unwrap();
        let err = load_adjacency(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported"));
    }

    #[test]
    fn test_empty_declaration_is_rejected() {
        assert!(parse_adjacency(r#"{"areas": []}"#, AdjacencyFormat::Json).is_err());
    }

    #[test]
    fn test_builtin_four_area_shape() {
        let decl = four_area_feeder();
        assert_eq!(decl.roots().count(), 1);
        assert_eq!(decl.area("area3").unwrap().down[0].area, "area4");
    }
}
