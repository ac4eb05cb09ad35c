//! YAML configuration loader with include and environment variable support
//!
//! Provides functionality to load YAML configuration files with:
//! - `$include` directives for file composition
//! - `${ENV:default}` for environment variable expansion
//! - Deep merging of configurations

use crate::ToolingError;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::env;
use std::fs;
use std::path::Path;

/// Load and parse a YAML file with include support.
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<YamlValue, ToolingError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| ToolingError::General(format!("Failed to read YAML file {:?}: {}", path, e)))?;

    let mut value: YamlValue = serde_yaml::from_str(&content)
        .map_err(|e| ToolingError::General(format!("Failed to parse YAML file {:?}: {}", path, e)))?;

    let base_dir = path
        .parent()
        .ok_or_else(|| ToolingError::General("Invalid file path".to_string()))?;

    process_includes(&mut value, base_dir)?;
    expand_variables(&mut value)?;

    Ok(value)
}

/// Load and deserialize a YAML file into a specific type.
pub fn load_yaml_config<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ToolingError> {
    let yaml = load_yaml_file(path)?;
    let json = yaml_to_json(&yaml)?;

    serde_json::from_value(json)
        .map_err(|e| ToolingError::General(format!("Failed to deserialize configuration: {}", e)))
}

fn process_includes(value: &mut YamlValue, base_dir: &Path) -> Result<(), ToolingError> {
    match value {
        YamlValue::Mapping(map) => {
            if let Some(YamlValue::String(include_path)) =
                map.get(&YamlValue::String("$include".to_string()))
            {
                let include_full_path = base_dir.join(include_path);
                let included = load_yaml_file(&include_full_path)?;
                *value = included;
                return Ok(());
            }

            for (_, v) in map.iter_mut() {
                process_includes(v, base_dir)?;
            }
        }
        YamlValue::Sequence(seq) => {
            for item in seq.iter_mut() {
                process_includes(item, base_dir)?;
            }
        }
        _ => {}
    }

    Ok(())
}

/// Expand environment variables in the format `${ENV_VAR:default}`.
fn expand_variables(value: &mut YamlValue) -> Result<(), ToolingError> {
    match value {
        YamlValue::String(s) => {
            if let Some(expanded) = expand_env_in_string(s) {
                *s = expanded;
            }
        }
        YamlValue::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_variables(v)?;
            }
        }
        YamlValue::Sequence(seq) => {
            for item in seq.iter_mut() {
                expand_variables(item)?;
            }
        }
        _ => {}
    }

    Ok(())
}

/// Expand `${ENV_VAR:default_value}` occurrences in a string.
pub fn expand_env_in_string(s: &str) -> Option<String> {
    if !s.contains("${") {
        return None;
    }

    let mut result = s.to_string();
    let re = regex::Regex::new(r"\$\{([^:}]+)(?::([^}]*))?\}").ok()?;

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0)?.as_str();
        let var_name = cap.get(1)?.as_str();
        let default_value = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        let value = env::var(var_name).unwrap_or_else(|_| default_value.to_string());
        result = result.replace(full_match, &value);
    }

    Some(result)
}

fn yaml_to_json(yaml: &YamlValue) -> Result<JsonValue, ToolingError> {
    match yaml {
        YamlValue::Null => Ok(JsonValue::Null),
        YamlValue::Bool(b) => Ok(JsonValue::Bool(*b)),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(JsonValue::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(JsonValue::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| ToolingError::General(format!("Invalid number: {}", f)))
            } else {
                Err(ToolingError::General("Invalid number".to_string()))
            }
        }
        YamlValue::String(s) => Ok(JsonValue::String(s.clone())),
        YamlValue::Sequence(seq) => {
            let json_seq: Result<Vec<JsonValue>, _> = seq.iter().map(yaml_to_json).collect();
            Ok(JsonValue::Array(json_seq?))
        }
        YamlValue::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    YamlValue::String(s) => s.clone(),
                    _ => return Err(ToolingError::General("Map keys must be strings".to_string())),
                };
                json_map.insert(key, yaml_to_json(v)?);
            }
            Ok(JsonValue::Object(json_map))
        }
        YamlValue::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

/// Merge two YAML values deeply. For objects, merges keys recursively; otherwise
/// `other` overrides `base`.
pub fn deep_merge(base: &mut YamlValue, other: &YamlValue) {
    match (base, other) {
        (YamlValue::Mapping(base_map), YamlValue::Mapping(other_map)) => {
            for (key, other_value) in other_map {
                if let Some(base_value) = base_map.get_mut(key) {
                    deep_merge(base_value, other_value);
                } else {
                    base_map.insert(key.clone(), other_value.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_expand_env_in_string() {
        env::set_var("TOOLING_TEST_LOADER_VAR", "test_value");
        let result = expand_env_in_string("prefix ${TOOLING_TEST_LOADER_VAR} suffix");
        assert_eq!(result, Some("prefix test_value suffix".to_string()));
        env::remove_var("TOOLING_TEST_LOADER_VAR");
    }

    #[test]
    fn test_expand_env_with_default() {
        let result = expand_env_in_string("value: ${MISSING_LOADER_VAR:default_val}");
        assert_eq!(result, Some("value: default_val".to_string()));
    }

    #[test]
    fn test_yaml_to_json() {
        let yaml_str = r#"
            string: "hello"
            number: 42
            bool: true
            array: [1, 2, 3]
            object:
              nested: "value"
        "#;

        let yaml: YamlValue = serde_yaml::from_str(yaml_str).unwrap();
        let json = yaml_to_json(&yaml).unwrap();

        assert_eq!(json["string"], "hello");
        assert_eq!(json["number"], 42);
        assert_eq!(json["bool"], true);
        assert_eq!(json["array"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_deep_merge() {
        let mut base: YamlValue = serde_yaml::from_str("a: 1\nb:\n  c: 2\n  d: 3\n").unwrap();
        let other: YamlValue = serde_yaml::from_str("b:\n  c: 20\n  e: 4\nf: 5\n").unwrap();

        deep_merge(&mut base, &other);

        let json = yaml_to_json(&base).unwrap();
        assert_eq!(json["a"], 1);
        assert_eq!(json["b"]["c"], 20);
        assert_eq!(json["b"]["d"], 3);
        assert_eq!(json["b"]["e"], 4);
        assert_eq!(json["f"], 5);
    }

    #[test]
    fn test_load_yaml_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "test: \"value\"\nnumber: 42\n")?;

        let yaml = load_yaml_file(temp_file.path())?;
        let json = yaml_to_json(&yaml)?;

        assert_eq!(json["test"], "value");
        assert_eq!(json["number"], 42);

        Ok(())
    }
}
