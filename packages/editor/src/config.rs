use crate::errors::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name the CLI looks for in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "pagekit.config.json";

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum history entries retained (0 = unlimited)
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Prop keys carried over when a block's variant is replaced
    #[serde(default = "default_universal_props")]
    pub universal_props: Vec<String>,

    /// Prop keys rewritten by a global theme
    #[serde(default)]
    pub theme_keys: ThemeKeys,

    /// Known block families, used to infer a block type from a variant name
    #[serde(default = "default_block_families")]
    pub block_families: Vec<String>,
}

/// The prop-key pair a global theme rewrites on every block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeKeys {
    pub background: String,
    pub accent: String,
}

impl Default for ThemeKeys {
    fn default() -> Self {
        Self {
            background: "backgroundColor".to_string(),
            accent: "accentColor".to_string(),
        }
    }
}

fn default_max_history() -> usize {
    100
}

fn default_universal_props() -> Vec<String> {
    [
        "backgroundColor",
        "accentColor",
        "textColor",
        "primaryColor",
        "title",
        "subtitle",
        "headline",
        "description",
        "ctaText",
        "ctaLink",
        "secondaryCtaText",
        "secondaryCtaLink",
        "logo",
        "links",
        "navLinks",
        "features",
        "tiers",
        "plans",
        "items",
        "testimonials",
        "copyright",
    ]
    .iter()
    .map(|key| key.to_string())
    .collect()
}

fn default_block_families() -> Vec<String> {
    [
        "Navbar",
        "Hero",
        "Features",
        "Pricing",
        "Testimonials",
        "CTA",
        "FAQ",
        "Contact",
        "Footer",
    ]
    .iter()
    .map(|family| family.to_string())
    .collect()
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EditorError> {
        serde_json::from_str(json).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load `pagekit.config.json` from `dir`, or defaults if there is none
    pub fn load_or_default(dir: &Path) -> Result<Self, EditorError> {
        let path = dir.join(DEFAULT_CONFIG_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn is_universal_prop(&self, key: &str) -> bool {
        self.universal_props.iter().any(|k| k == key)
    }

    /// Infer a block's logical type from its variant by longest family
    /// prefix. Unknown variants are their own type.
    pub fn infer_block_type(&self, variant: &str) -> String {
        self.block_families
            .iter()
            .filter(|family| variant.starts_with(family.as_str()))
            .max_by_key(|family| family.len())
            .cloned()
            .unwrap_or_else(|| variant.to_string())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            universal_props: default_universal_props(),
            theme_keys: ThemeKeys::default(),
            block_families: default_block_families(),
        }
    }
}
