//! # Block Model
//!
//! One placed section instance on a page.
//!
//! A block carries:
//! - **Identity**: an opaque `id`, assigned at creation and never reassigned
//! - **Family and renderer**: `type` selects the parameter schema, `variant`
//!   selects the concrete renderer
//! - **Parameters**: a schema-less `props` bag consumed by the renderer
//! - **Overlays**: per-element style and text overrides keyed by element-key
//!
//! Overlays are additive. A missing entry means "no override"; the renderer
//! falls back to the variant default. Unknown element-keys are inert.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter bag handed to a variant renderer
pub type Props = Map<String, Value>;

/// Style override record (CSS-like property → value)
pub type StyleMap = BTreeMap<String, String>;

/// Stable name of a sub-element inside a block's render tree
pub type ElementKey = String;

/// Opaque, stable block identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A placed, parameterized page section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,

    /// Logical component family (e.g. "Hero")
    #[serde(rename = "type")]
    pub block_type: String,

    /// Concrete renderer selector (e.g. "HeroModern")
    pub variant: String,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub element_styles: BTreeMap<ElementKey, StyleMap>,

    #[serde(default)]
    pub element_content: BTreeMap<ElementKey, String>,
}

impl Block {
    /// Create a block with empty props and no overlays
    pub fn new(id: impl Into<BlockId>, block_type: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            variant: variant.into(),
            props: Props::new(),
            element_styles: BTreeMap::new(),
            element_content: BTreeMap::new(),
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Style override for an element, `None` when never set
    pub fn element_style(&self, key: &str) -> Option<&StyleMap> {
        self.element_styles.get(key)
    }

    /// Text override for an element, `None` when never set
    pub fn element_text(&self, key: &str) -> Option<&str> {
        self.element_content.get(key).map(String::as_str)
    }

    /// Shallow-merge `partial` into props. Later keys win; nested values are
    /// replaced wholesale.
    pub fn merge_props(&mut self, partial: &Props) {
        for (key, value) in partial {
            self.props.insert(key.clone(), value.clone());
        }
    }

    /// Shallow-merge `partial` into the style overlay for `key`, creating it
    /// if absent
    pub fn merge_element_style(&mut self, key: &str, partial: &StyleMap) {
        let entry = self.element_styles.entry(key.to_string()).or_default();
        for (property, value) in partial {
            entry.insert(property.clone(), value.clone());
        }
    }

    pub fn set_element_text(&mut self, key: &str, text: &str) {
        self.element_content.insert(key.to_string(), text.to_string());
    }
}

/// Build a `Props` bag from a JSON object literal.
///
/// Non-object values produce an empty bag.
pub fn props_from_value(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}
