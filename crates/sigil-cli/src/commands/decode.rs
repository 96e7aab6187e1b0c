//! Decode command

use super::load_config;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use sigil_core::{ResourceId, ResourcePath};
use sigil_runtime::{decode_resource, Resource, ResourceKind};
use std::path::Path;

pub fn run(file: &str, kind: Option<&str>, format: &str, config: Option<&str>) -> Result<()> {
    let config = load_config(config)?;
    let path = Path::new(file);
    let kind = resolve_kind(path, kind)?;
    let id = resource_id(path)?;

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", file))?;
    let resource = decode_resource(kind, id, &ResourcePath::root(), &bytes, &config)
        .with_context(|| format!("Failed to decode {}", file))?;

    let output = match &resource {
        Resource::Routine(def) => render(def.as_ref(), format)?,
        Resource::Generator(def) => render(def.as_ref(), format)?,
        Resource::KeyFrames(set) => render(set.as_ref(), format)?,
    };
    println!("{}", output);
    Ok(())
}

/// Kind from the `--kind` flag, falling back to the file extension
fn resolve_kind(path: &Path, kind: Option<&str>) -> Result<ResourceKind> {
    let name = match kind {
        Some(kind) => kind,
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("Cannot infer resource kind of {}; pass --kind", path.display()))?,
    };
    ResourceKind::from_extension(name).ok_or_else(|| anyhow!("Unknown resource kind: {}", name))
}

/// The resource id is the file stem
fn resource_id(path: &Path) -> Result<ResourceId> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Invalid file name: {}", path.display()))?;
    stem.parse().map_err(|reason: String| anyhow!(reason))
}

pub fn render<T: Serialize>(value: &T, format: &str) -> Result<String> {
    Ok(match format {
        "json" => serde_json::to_string_pretty(value)?,
        "toml" => toml::to_string_pretty(value)?,
        _ => anyhow::bail!("Unknown format: {}", format),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_decode::{KeyFrame, KeyFrameSet};

    #[test]
    fn kind_comes_from_flag_or_extension() {
        let path = Path::new("fx/fire.generator");
        assert_eq!(resolve_kind(path, None).unwrap(), ResourceKind::Generator);
        assert_eq!(
            resolve_kind(path, Some("routine")).unwrap(),
            ResourceKind::Routine
        );
        assert!(resolve_kind(Path::new("fire"), None).is_err());
    }

    #[test]
    fn id_is_the_file_stem() {
        let id = resource_id(Path::new("fx/fire.routine")).unwrap();
        assert_eq!(id, ResourceId::from_name("fire"));
    }

    #[test]
    fn renders_json_and_toml() {
        let set = KeyFrameSet::new(
            ResourceId::from_name("fade"),
            vec![KeyFrame {
                time: 0.5,
                value: 1.0,
            }],
        );
        let json = render(&set, "json").unwrap();
        assert!(json.contains("\"fade\""));
        let toml = render(&set, "toml").unwrap();
        assert!(toml.contains("fade"));
        assert!(render(&set, "yaml").is_err());
    }
}
