use std::env;
use std::path::PathBuf;

use crate::visualize::VisualizationSettings;

/// Models fetched by the build script end up here.
pub const DEFAULT_MODEL_DIR: &str = match option_env!("OCR_DEFAULT_MODEL_DIR") {
    Some(dir) => dir,
    None => "models",
};

const DEFAULT_THREADS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model_dir: PathBuf,
    pub visualize: bool,
    pub visualization_dir: Option<PathBuf>,
    pub threads: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            model_dir: var("OCR_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            visualize: var("OCR_VISUALIZE")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
            visualization_dir: var("OCR_VISUALIZATION_DIR").map(PathBuf::from),
            threads: var("OCR_THREADS")
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_THREADS),
        }
    }

    pub fn visualization(&self) -> VisualizationSettings {
        VisualizationSettings {
            enabled: self.visualize,
            output_dir: self.visualization_dir.clone(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert!(config.visualize);
        assert_eq!(config.visualization_dir, None);
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("OCR_MODEL_DIR", "/opt/models"),
            ("OCR_VISUALIZE", "off"),
            ("OCR_VISUALIZATION_DIR", "/tmp/vis"),
            ("OCR_THREADS", "2"),
        ]);
        assert_eq!(config.model_dir, PathBuf::from("/opt/models"));
        assert!(!config.visualize);
        assert_eq!(config.visualization_dir, Some(PathBuf::from("/tmp/vis")));
        assert_eq!(config.threads, 2);

        let settings = config.visualization();
        assert!(!settings.enabled);
        assert_eq!(settings.output_dir, Some(PathBuf::from("/tmp/vis")));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[("OCR_VISUALIZE", "maybe"), ("OCR_THREADS", "-3")]);
        assert!(config.visualize);
        assert_eq!(config.threads, 4);
    }
}
