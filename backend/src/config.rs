use crate::classifier::labels::{LabelTable, LabelTableError};
use crate::classifier::{InputLayout, OutputKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Failed to read model manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse model manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid label table in {path}: {source}")]
    Labels {
        path: PathBuf,
        source: LabelTableError,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_manifest: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub preload_model: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: v })?,
            None => 5000,
        };
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAX_UPLOAD_BYTES",
                value: v,
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let preload_model = match lookup("PRELOAD_MODEL") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue {
                key: "PRELOAD_MODEL",
                value: v,
            })?,
            None => true,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            model_manifest: lookup("MODEL_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("model/model.yaml")),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            max_upload_bytes,
            preload_model,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    Onnx,
    Torchscript,
}

/// On-disk description of a classifier artifact. It ships next to the
/// artifact, so the label order always matches the model it describes.
#[derive(Debug, Deserialize)]
struct ModelManifest {
    version: String,
    backend: ModelBackend,
    artifact: PathBuf,
    #[serde(default)]
    input_layout: InputLayout,
    #[serde(default)]
    output: OutputKind,
    labels: Vec<String>,
}

/// A validated manifest with the artifact path resolved.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub version: String,
    pub backend: ModelBackend,
    pub artifact: PathBuf,
    pub input_layout: InputLayout,
    pub output: OutputKind,
    pub labels: LabelTable,
}

impl ModelSpec {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let manifest: ModelManifest =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let labels = LabelTable::from_names(&manifest.labels).map_err(|source| {
            ConfigError::Labels {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let artifact = if manifest.artifact.is_absolute() {
            manifest.artifact
        } else {
            path.parent()
                .unwrap_or_else(|| Path::new("."))
                .join(manifest.artifact)
        };

        Ok(Self {
            version: manifest.version,
            backend: manifest.backend,
            artifact,
            input_layout: manifest.input_layout,
            output: manifest.output,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MANIFEST: &str = r#"
version: mobilenet-final-1
backend: onnx
artifact: mobilenet_final.onnx
labels: ["dry ", "acne", "pigmentation", "wrinkle", "dark circles", "normal"]
"#;

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.model_manifest, PathBuf::from("model/model.yaml"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.preload_model);
    }

    #[test]
    fn env_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8081"),
            ("PRELOAD_MODEL", "no"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8081");
        assert!(!config.preload_model);
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
        let err = AppConfig::from_lookup(lookup(&[("PRELOAD_MODEL", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PRELOAD_MODEL", .. }));
    }

    #[test]
    fn manifest_resolves_artifact_next_to_itself() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(MANIFEST.as_bytes())
            .unwrap();

        let spec = ModelSpec::load(&path).unwrap();
        assert_eq!(spec.version, "mobilenet-final-1");
        assert_eq!(spec.backend, ModelBackend::Onnx);
        assert_eq!(spec.artifact, dir.path().join("mobilenet_final.onnx"));
        assert_eq!(spec.input_layout, InputLayout::Nhwc);
        assert_eq!(spec.output, OutputKind::Probabilities);
        assert_eq!(spec.labels, LabelTable::default());
    }

    #[test]
    fn manifest_with_unknown_label_is_rejected() {
        let raw = MANIFEST.replace("wrinkle", "freckles");
        let err = ModelSpec::parse(&raw, Path::new("model.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Labels { .. }));
    }

    #[test]
    fn missing_manifest_is_a_read_error() {
        let err = ModelSpec::load(Path::new("/nonexistent/model.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn torchscript_manifest_parses_layout_and_output() {
        let raw = MANIFEST
            .replace("backend: onnx", "backend: torchscript\ninput_layout: nchw\noutput: logits");
        let spec = ModelSpec::parse(&raw, Path::new("/models/model.yaml")).unwrap();
        assert_eq!(spec.backend, ModelBackend::Torchscript);
        assert_eq!(spec.input_layout, InputLayout::Nchw);
        assert_eq!(spec.output, OutputKind::Logits);
        assert_eq!(spec.artifact, PathBuf::from("/models/mobilenet_final.onnx"));
    }
}
