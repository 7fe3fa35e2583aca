//! On-disk TOML configuration.
//!
//! All fields are optional so partial configs work (merge with
//! defaults). A CWD `.examgen.toml` is cascaded over the platform
//! config file; CWD values win.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Config, ScoringWeights, SyllabusRules};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub models: Option<ModelsConfig>,
    pub scoring: Option<ScoringConfig>,
    pub parsing: Option<ParsingConfig>,
    pub generation: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub groq_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub classifier_model: Option<String>,
    pub generator_model: Option<String>,
    pub vision_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub hours_weight: Option<f64>,
    pub frequency_weight: Option<f64>,
    pub min_allocation_score: Option<f64>,
    pub total_questions: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingConfig {
    pub min_hours: Option<u32>,
    pub max_hours: Option<u32>,
    pub min_topic_len: Option<usize>,
    pub min_fragment_len: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub deadline_secs: Option<u64>,
    pub focus_topics: Option<usize>,
}

/// Platform config path: `<config_dir>/examgen/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("examgen").join("config.toml"))
}

/// Load config by cascading CWD `.examgen.toml` over platform config.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".examgen.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file
/// doesn't exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            groq_key: overlay
                .api_keys
                .as_ref()
                .and_then(|a| a.groq_key.clone())
                .or_else(|| base.api_keys.as_ref().and_then(|a| a.groq_key.clone())),
        }),
        models: Some(ModelsConfig {
            classifier_model: overlay
                .models
                .as_ref()
                .and_then(|m| m.classifier_model.clone())
                .or_else(|| base.models.as_ref().and_then(|m| m.classifier_model.clone())),
            generator_model: overlay
                .models
                .as_ref()
                .and_then(|m| m.generator_model.clone())
                .or_else(|| base.models.as_ref().and_then(|m| m.generator_model.clone())),
            vision_model: overlay
                .models
                .as_ref()
                .and_then(|m| m.vision_model.clone())
                .or_else(|| base.models.as_ref().and_then(|m| m.vision_model.clone())),
        }),
        scoring: Some(ScoringConfig {
            hours_weight: overlay
                .scoring
                .as_ref()
                .and_then(|s| s.hours_weight)
                .or_else(|| base.scoring.as_ref().and_then(|s| s.hours_weight)),
            frequency_weight: overlay
                .scoring
                .as_ref()
                .and_then(|s| s.frequency_weight)
                .or_else(|| base.scoring.as_ref().and_then(|s| s.frequency_weight)),
            min_allocation_score: overlay
                .scoring
                .as_ref()
                .and_then(|s| s.min_allocation_score)
                .or_else(|| base.scoring.as_ref().and_then(|s| s.min_allocation_score)),
            total_questions: overlay
                .scoring
                .as_ref()
                .and_then(|s| s.total_questions)
                .or_else(|| base.scoring.as_ref().and_then(|s| s.total_questions)),
        }),
        parsing: Some(ParsingConfig {
            min_hours: overlay
                .parsing
                .as_ref()
                .and_then(|p| p.min_hours)
                .or_else(|| base.parsing.as_ref().and_then(|p| p.min_hours)),
            max_hours: overlay
                .parsing
                .as_ref()
                .and_then(|p| p.max_hours)
                .or_else(|| base.parsing.as_ref().and_then(|p| p.max_hours)),
            min_topic_len: overlay
                .parsing
                .as_ref()
                .and_then(|p| p.min_topic_len)
                .or_else(|| base.parsing.as_ref().and_then(|p| p.min_topic_len)),
            min_fragment_len: overlay
                .parsing
                .as_ref()
                .and_then(|p| p.min_fragment_len)
                .or_else(|| base.parsing.as_ref().and_then(|p| p.min_fragment_len)),
        }),
        generation: Some(GenerationConfig {
            deadline_secs: overlay
                .generation
                .as_ref()
                .and_then(|g| g.deadline_secs)
                .or_else(|| base.generation.as_ref().and_then(|g| g.deadline_secs)),
            focus_topics: overlay
                .generation
                .as_ref()
                .and_then(|g| g.focus_topics)
                .or_else(|| base.generation.as_ref().and_then(|g| g.focus_topics)),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}

impl Config {
    /// Apply file values on top of an existing runtime config. Values
    /// already set from higher-precedence sources (flags, env) are only
    /// filled when currently at their defaults/None.
    pub fn apply_file(mut self, file: &ConfigFile) -> Self {
        if self.api_key.is_none() {
            self.api_key = file.api_keys.as_ref().and_then(|a| a.groq_key.clone());
        }
        if let Some(models) = &file.models {
            if let Some(model) = &models.classifier_model {
                self.classifier_model = model.clone();
            }
            if let Some(model) = &models.generator_model {
                self.generator_model = model.clone();
            }
            if let Some(model) = &models.vision_model {
                self.vision_model = Some(model.clone());
            }
        }
        if let Some(scoring) = &file.scoring {
            let defaults = ScoringWeights::default();
            self.weights = ScoringWeights {
                hours: scoring.hours_weight.unwrap_or(defaults.hours),
                frequency: scoring.frequency_weight.unwrap_or(defaults.frequency),
            };
            if let Some(score) = scoring.min_allocation_score {
                self.min_allocation_score = score;
            }
            if let Some(total) = scoring.total_questions {
                self.total_questions = total;
            }
        }
        if let Some(parsing) = &file.parsing {
            let defaults = SyllabusRules::default();
            self.syllabus_rules = SyllabusRules {
                min_hours: parsing.min_hours.unwrap_or(defaults.min_hours),
                max_hours: parsing.max_hours.unwrap_or(defaults.max_hours),
                min_topic_len: parsing.min_topic_len.unwrap_or(defaults.min_topic_len),
            };
            if let Some(len) = parsing.min_fragment_len {
                self.min_fragment_len = len;
            }
        }
        if let Some(generation) = &file.generation {
            if let Some(secs) = generation.deadline_secs {
                self.generation_deadline_secs = Some(secs);
            }
            if let Some(n) = generation.focus_topics {
                self.focus_topics = n;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_round_trip_toml() {
        let config = ConfigFile {
            scoring: Some(ScoringConfig {
                hours_weight: Some(0.5),
                frequency_weight: Some(0.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scoring.unwrap().hours_weight.unwrap(), 0.5);
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            api_keys: Some(ApiKeysConfig {
                groq_key: Some("base_key".to_string()),
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            api_keys: Some(ApiKeysConfig {
                groq_key: Some("overlay_key".to_string()),
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        assert_eq!(merged.api_keys.unwrap().groq_key.unwrap(), "overlay_key");
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            models: Some(ModelsConfig {
                generator_model: Some("llama-3.3-70b-versatile".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.models.unwrap().generator_model.unwrap(),
            "llama-3.3-70b-versatile"
        );
    }

    #[test]
    fn apply_file_keeps_flag_provided_key() {
        let file = ConfigFile {
            api_keys: Some(ApiKeysConfig {
                groq_key: Some("file_key".to_string()),
            }),
            ..Default::default()
        };
        let config = Config {
            api_key: Some("flag_key".to_string()),
            ..Default::default()
        }
        .apply_file(&file);
        assert_eq!(config.api_key.as_deref(), Some("flag_key"));

        let config = Config::default().apply_file(&file);
        assert_eq!(config.api_key.as_deref(), Some("file_key"));
    }

    #[test]
    fn apply_file_overrides_weights() {
        let file = ConfigFile {
            scoring: Some(ScoringConfig {
                hours_weight: Some(0.5),
                frequency_weight: Some(0.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = Config::default().apply_file(&file);
        assert_eq!(config.weights.hours, 0.5);
        assert_eq!(config.weights.frequency, 0.5);
    }
}
