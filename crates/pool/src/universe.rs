use std::path::Path;

use tracing::{info, warn};

use common::{Error, Result, TargetUniverse};

/// Concepts used when no universe file exists.
pub const DEFAULT_CONCEPTS: [&str; 2] = ["人工智能", "风电"];

pub fn default_universe() -> TargetUniverse {
    TargetUniverse::new(Vec::<String>::new(), DEFAULT_CONCEPTS)
}

/// Read the target universe from a JSON document.
///
/// A missing file falls back to [`default_universe`]. A file that exists but
/// cannot be parsed is a configuration error.
pub fn load_universe(path: &Path) -> Result<TargetUniverse> {
    if !path.exists() {
        warn!(path = %path.display(), "Universe file not found, using default concepts");
        return Ok(default_universe());
    }

    let json = std::fs::read_to_string(path)?;
    let universe: TargetUniverse = serde_json::from_str(&json)
        .map_err(|e| Error::Config(format!("invalid universe file {}: {e}", path.display())))?;

    info!(
        industries = universe.target_industries.len(),
        concepts = universe.target_concepts.len(),
        "Target universe loaded"
    );
    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let universe = load_universe(&dir.path().join("zpool.json")).unwrap();
        assert!(universe.target_industries.is_empty());
        assert!(universe.target_concepts.contains("风电"));
        assert_eq!(universe.target_concepts.len(), 2);
    }

    #[test]
    fn reads_both_key_styles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zpool.json");
        std::fs::write(
            &path,
            r#"{"targetIndustries":["Software"],"target_concepts":["robotics"]}"#,
        )
        .unwrap();
        let universe = load_universe(&path).unwrap();
        assert!(universe.target_industries.contains("Software"));
        assert!(universe.target_concepts.contains("robotics"));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zpool.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_universe(&path), Err(Error::Config(_))));
    }
}
