use lessonkit_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "lessonkit.config.json";

/// Lessonkit configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding `lessons/` and `courses/`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Course used by `lessons` when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_course: Option<String>,

    /// Editor tuning (autosave debounce, history limit)
    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_data_dir() -> String {
    "content".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to the data directory
    pub fn get_data_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.data_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_course: None,
            editor: EditorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "dataDir": "courses-data",
            "defaultCourse": "rust-101",
            "editor": { "autosaveDebounceMs": 5000, "historyLimit": 20 }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, "courses-data");
        assert_eq!(config.default_course.as_deref(), Some("rust-101"));
        assert_eq!(config.editor.autosave_debounce_ms, 5000);
        assert_eq!(config.editor.history_limit, 20);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_dir, "content");
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert_eq!(config.data_dir, "content");
    }
}
