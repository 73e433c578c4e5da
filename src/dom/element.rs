use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single interactive element lifted out of a page's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomElement {
    pub tag_name: String,
    pub element_id: Option<String>,
    pub class_name: Option<String>,
    pub text_content: Option<String>,
    pub attributes: HashMap<String, String>,
    pub is_visible: bool,
    pub is_editable: bool,
    pub is_clickable: bool,
    pub css_selector: String,
}

impl DomElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            element_id: None,
            class_name: None,
            text_content: None,
            attributes: HashMap::new(),
            is_visible: true,
            is_editable: false,
            is_clickable: false,
            css_selector: String::new(),
        }
    }

    pub fn with_text_content(mut self, text: String) -> Self {
        self.text_content = Some(text);
        self
    }

    pub fn with_attribute(mut self, key: String, value: String) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Concatenation of the attribute values the locator's keyword fallback
    /// scores against: placeholder, id, class, name, aria-label and the
    /// element's own text.
    pub fn scoring_haystack(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for key in ["placeholder", "id", "class", "name", "aria-label", "data-placeholder"] {
            if let Some(v) = self.attributes.get(key) {
                parts.push(v);
            }
        }
        if let Some(text) = &self.text_content {
            parts.push(text);
        }
        parts.join(" ").to_lowercase()
    }
}
