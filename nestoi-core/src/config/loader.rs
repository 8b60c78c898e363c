use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::{ConfigError, ENV_PREFIX};

/// Load a YAML file, if it exists, and merge it over `tree`.
pub(crate) fn merge_yaml_file(path: &Path, tree: &mut Value) -> Result<(), ConfigError> {
    if path.exists() {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        let yaml: Value = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        merge(tree, yaml);
    }
    Ok(())
}

/// Recursively merge `overlay` into `base`. Mappings merge key by key; any
/// other overlay value replaces the base value.
pub(crate) fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

/// Overlay `NESTOI__SECTION__KEY=value` variables onto the settings tree.
///
/// Path segments are lowercased with `_` mapped to `-`, so
/// `NESTOI__RATE_LIMIT__WINDOW_MINUTES=5` sets `rate-limit.window-minutes`.
/// Values are parsed as YAML scalars: `5` is a number, `true` a boolean.
pub fn apply_env_overlay<I>(tree: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (name, raw) in vars {
        let Some(path) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = path
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_lowercase().replace('_', "-"))
            .collect();
        if segments.is_empty() {
            continue;
        }

        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        let mut overlay = value;
        for segment in segments.iter().rev() {
            let mut map = Mapping::new();
            map.insert(Value::String(segment.clone()), overlay);
            overlay = Value::Mapping(map);
        }
        merge(tree, overlay);
    }
}
