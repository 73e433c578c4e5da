use crate::core::BrowserTrait;
use crate::dom::DomElement;
use crate::errors::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Snapshot of a page taken for diagnostics or server-side element analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub elements: Vec<DomElement>,
    pub screenshot_base64: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Parses page markup with `scraper` and lifts out the elements the locator's
/// structural fallback ranks. Runs entirely on this side of the wire; the
/// page only has to hand over `outerHTML` once.
pub struct DomInspector;

// Candidate selectors for form-like controls. Kept deliberately wide: the
// fallback trades precision for recall.
const CANDIDATE_SELECTORS: &[&str] = &[
    "input",
    "textarea",
    "select",
    "button",
    "[contenteditable='true']",
    "[contenteditable='']",
    "[role='button']",
    "[role='textbox']",
    "[role='searchbox']",
    "[role='combobox']",
    "a",
];

impl DomInspector {
    /// Capture the current page state through the browser handle.
    pub async fn capture<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        include_screenshot: bool,
    ) -> Result<PageSnapshot> {
        let url = browser.get_url(tab).await?;
        let title = browser.get_title(tab).await?;

        let html_value = browser
            .execute_script(tab, "document.documentElement.outerHTML")
            .await?;
        let html = html_value.as_str().unwrap_or("");

        let elements = Self::interactive_candidates(html);

        let screenshot_base64 = if include_screenshot {
            let bytes = browser.take_screenshot(tab).await?;
            Some(BASE64.encode(bytes))
        } else {
            None
        };

        Ok(PageSnapshot {
            url,
            title,
            elements,
            screenshot_base64,
            timestamp: chrono::Utc::now(),
        })
    }

    /// Extract every candidate interactive element from raw markup.
    pub fn interactive_candidates(html: &str) -> Vec<DomElement> {
        let document = Html::parse_document(html);
        let mut elements = Vec::new();
        let mut seen = HashSet::new();

        for selector_str in CANDIDATE_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for element_ref in document.select(&selector) {
                let raw = element_ref.value();

                // Dedupe elements matched by more than one candidate selector.
                let fingerprint = format!(
                    "{}_{}",
                    raw.name(),
                    raw.attrs()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect::<Vec<_>>()
                        .join("_")
                );
                if !seen.insert(fingerprint) {
                    continue;
                }

                let mut attributes = HashMap::new();
                for (name, value) in raw.attrs() {
                    attributes.insert(name.to_string(), value.to_string());
                }

                let text = element_ref.text().collect::<Vec<_>>().join(" ");
                let text = text.trim();

                let mut element = DomElement::new(raw.name().to_string());
                if !text.is_empty() {
                    element = element.with_text_content(text.to_string());
                }
                for (key, value) in &attributes {
                    if key == "id" {
                        element.element_id = Some(value.clone());
                    } else if key == "class" {
                        element.class_name = Some(value.clone());
                    }
                    element = element.with_attribute(key.clone(), value.clone());
                }

                element.css_selector = Self::css_selector_for(&element_ref, &attributes);
                element.is_visible = !Self::is_hidden(&attributes);
                element.is_editable = Self::is_editable(raw.name(), &attributes);
                element.is_clickable = Self::is_clickable(raw.name(), &attributes);

                elements.push(element);
            }
        }

        elements
    }

    fn css_selector_for(
        element_ref: &ElementRef,
        attributes: &HashMap<String, String>,
    ) -> String {
        let tag_name = element_ref.value().name();

        if let Some(id) = attributes.get("id") {
            format!("{}#{}", tag_name, id)
        } else if let Some(name) = attributes.get("name") {
            format!("{}[name='{}']", tag_name, name)
        } else if let Some(placeholder) = attributes.get("placeholder") {
            format!("{}[placeholder='{}']", tag_name, placeholder)
        } else if let Some(class) = attributes.get("class") {
            let classes: Vec<&str> = class.split_whitespace().collect();
            if classes.is_empty() {
                tag_name.to_string()
            } else {
                format!("{}.{}", tag_name, classes.join("."))
            }
        } else if let Some(role) = attributes.get("role") {
            format!("{}[role='{}']", tag_name, role)
        } else if let Some(aria_label) = attributes.get("aria-label") {
            format!("{}[aria-label='{}']", tag_name, aria_label)
        } else {
            tag_name.to_string()
        }
    }

    fn is_hidden(attributes: &HashMap<String, String>) -> bool {
        if attributes.contains_key("hidden") {
            return true;
        }
        if attributes.get("type").map(|t| t == "hidden").unwrap_or(false) {
            return true;
        }
        if let Some(style) = attributes.get("style") {
            let style = style.replace(' ', "").to_lowercase();
            if style.contains("display:none") || style.contains("visibility:hidden") {
                return true;
            }
        }
        attributes
            .get("aria-hidden")
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    fn is_editable(tag_name: &str, attributes: &HashMap<String, String>) -> bool {
        match tag_name {
            "textarea" => true,
            "input" => {
                let input_type = attributes.get("type").map(|s| s.as_str()).unwrap_or("text");
                !matches!(input_type, "hidden" | "submit" | "button" | "checkbox" | "radio")
            }
            _ => attributes
                .get("contenteditable")
                .map(|v| v.is_empty() || v == "true")
                .unwrap_or(false),
        }
    }

    fn is_clickable(tag_name: &str, attributes: &HashMap<String, String>) -> bool {
        if matches!(tag_name, "a" | "button") {
            return true;
        }
        if tag_name == "input" {
            let input_type = attributes.get("type").map(|s| s.as_str()).unwrap_or("text");
            return !matches!(input_type, "hidden");
        }
        if attributes.contains_key("onclick") {
            return true;
        }
        if let Some(role) = attributes.get("role") {
            return matches!(role.as_str(), "button" | "link" | "tab" | "menuitem" | "switch");
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
            <input type="file" accept="video/*" class="upload-input">
            <input type="text" placeholder="填写作品标题" class="semi-input">
            <div contenteditable="true" data-placeholder="添加作品简介"></div>
            <input type="hidden" name="csrf" value="x">
            <button class="semi-button semi-button-primary">发布</button>
            <button style="display: none">ghost</button>
        </body></html>
    "#;

    #[test]
    fn extracts_candidates_and_skips_nothing_visible() {
        let elements = DomInspector::interactive_candidates(SAMPLE);
        let file_input = elements
            .iter()
            .find(|e| e.attr("type") == Some("file"))
            .expect("file input extracted");
        assert!(file_input.is_clickable);
        assert!(file_input.is_visible);

        let hidden = elements
            .iter()
            .find(|e| e.attr("name") == Some("csrf"))
            .expect("hidden input extracted");
        assert!(!hidden.is_visible);
        assert!(!hidden.is_editable);
    }

    #[test]
    fn contenteditable_div_is_editable() {
        let elements = DomInspector::interactive_candidates(SAMPLE);
        let editor = elements
            .iter()
            .find(|e| e.attr("data-placeholder") == Some("添加作品简介"))
            .expect("rich editor extracted");
        assert!(editor.is_editable);
        assert!(!editor.is_clickable);
    }

    #[test]
    fn css_selector_prefers_stable_attributes() {
        let elements = DomInspector::interactive_candidates(SAMPLE);
        let title = elements
            .iter()
            .find(|e| e.attr("placeholder") == Some("填写作品标题"))
            .unwrap();
        assert_eq!(title.css_selector, "input[placeholder='填写作品标题']");

        let button = elements
            .iter()
            .find(|e| e.text_content.as_deref() == Some("发布"))
            .unwrap();
        assert_eq!(
            button.css_selector,
            "button.semi-button.semi-button-primary"
        );
    }

    #[test]
    fn inline_display_none_is_hidden() {
        let elements = DomInspector::interactive_candidates(SAMPLE);
        let ghost = elements
            .iter()
            .find(|e| e.text_content.as_deref() == Some("ghost"))
            .unwrap();
        assert!(!ghost.is_visible);
    }
}
