// Configuration type definitions

use serde::Deserialize;

use super::assist_types::AssistConfig;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub assist: AssistConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_top_level_sections_are_ignored() {
        let toml = r#"
[theme]
name = "dark"

[assist]
enabled = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.assist.enabled);
    }
}
