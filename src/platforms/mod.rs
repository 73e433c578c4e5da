//! Per-platform publish profiles.
//!
//! Each platform contributes a single data table: entry URL, field length
//! limits, the locator ladder for every semantic role it uses, and the
//! signals that mark login walls and publish results. The workflow engine
//! contains no per-site branches; supporting a new platform means writing
//! another one of these tables.

mod bilibili;
mod douyin;
mod kuaishou;
mod wechat;
mod xiaohongshu;
mod youtube;

use crate::locator::{LocatorSpec, SemanticRole};
use std::collections::HashMap;

/// Declarative description of how one platform's publish page is driven.
#[derive(Debug, Clone)]
pub struct PlatformSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub entry_url: &'static str,
    pub base_url: &'static str,
    pub title_limit: usize,
    pub description_limit: usize,
    /// Platforms without a dedicated tag control receive tags appended to
    /// the description as `#tag` tokens.
    pub tags_in_description: bool,
    /// URL fragments that mean the page bounced to a login wall.
    pub login_url_keywords: &'static [&'static str],
    /// URL fragments that confirm the publish went through.
    pub success_url_keywords: &'static [&'static str],
    /// Regex with one capture group extracting the remote video id from the
    /// post-publish URL, when the platform exposes one.
    pub video_id_pattern: Option<&'static str>,
    pub session_expiry_hours: i64,
    locators: HashMap<SemanticRole, LocatorSpec>,
}

impl PlatformSpec {
    pub(crate) fn with_locators(mut self, locators: Vec<LocatorSpec>) -> Self {
        for spec in locators {
            self.locators.insert(spec.role, spec);
        }
        self
    }

    pub(crate) fn base(name: &'static str, display_name: &'static str) -> Self {
        Self {
            name,
            display_name,
            entry_url: "",
            base_url: "",
            title_limit: 100,
            description_limit: 1000,
            tags_in_description: true,
            login_url_keywords: &["login", "passport", "sso", "auth"],
            success_url_keywords: &[],
            video_id_pattern: None,
            session_expiry_hours: 168,
            locators: HashMap::new(),
        }
    }

    pub fn locator(&self, role: SemanticRole) -> Option<&LocatorSpec> {
        self.locators.get(&role)
    }

    /// Roles the workflow cannot run without.
    pub fn required_roles() -> &'static [SemanticRole] {
        &[
            SemanticRole::FileInput,
            SemanticRole::TitleField,
            SemanticRole::SubmitButton,
        ]
    }
}

/// Every platform this build knows how to drive.
pub fn all() -> Vec<PlatformSpec> {
    vec![
        douyin::spec(),
        bilibili::spec(),
        kuaishou::spec(),
        xiaohongshu::spec(),
        wechat::spec(),
        youtube::spec(),
    ]
}

pub fn by_name(name: &str) -> Option<PlatformSpec> {
    all().into_iter().find(|p| p.name == name)
}

pub fn supported_names() -> Vec<&'static str> {
    all().into_iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_platforms() {
        for name in ["douyin", "bilibili", "kuaishou", "xiaohongshu", "wechat", "youtube"] {
            let spec = by_name(name).unwrap_or_else(|| panic!("{} missing", name));
            assert_eq!(spec.name, name);
            assert!(spec.entry_url.starts_with("https://"), "{}", name);
            assert!(spec.base_url.starts_with("https://"), "{}", name);
        }
        assert!(by_name("myspace").is_none());
    }

    #[test]
    fn every_platform_covers_required_roles() {
        for spec in all() {
            for role in PlatformSpec::required_roles() {
                let locator = spec
                    .locator(*role)
                    .unwrap_or_else(|| panic!("{} lacks {}", spec.name, role));
                assert!(
                    !locator.strategies.is_empty(),
                    "{} has an empty ladder for {}",
                    spec.name,
                    role
                );
            }
            // Login detection is what gates the human-login wait.
            assert!(spec.locator(SemanticRole::LoginIndicator).is_some());
        }
    }

    #[test]
    fn success_keywords_never_match_the_entry_url() {
        // A keyword that already matches the upload page would make the
        // verify step claim a redirect before anything was published.
        for spec in all() {
            for keyword in spec.success_url_keywords {
                assert!(
                    !spec.entry_url.contains(keyword),
                    "{}: success keyword '{}' matches the entry URL",
                    spec.name,
                    keyword
                );
            }
        }
    }

    #[test]
    fn platforms_without_inline_tags_have_a_tag_field() {
        // tags_in_description = false routes tags to a dedicated control;
        // without a TagField ladder they would be dropped entirely.
        for spec in all() {
            if !spec.tags_in_description {
                assert!(
                    spec.locator(SemanticRole::TagField).is_some(),
                    "{} takes tags out of the description but has no tag field",
                    spec.name
                );
            }
        }
    }

    #[test]
    fn field_limits_are_sane() {
        for spec in all() {
            assert!(spec.title_limit >= 20, "{}", spec.name);
            assert!(spec.description_limit >= spec.title_limit, "{}", spec.name);
        }
    }

    #[test]
    fn video_id_patterns_compile_and_capture() {
        for spec in all() {
            if let Some(pattern) = spec.video_id_pattern {
                let re = regex::Regex::new(pattern)
                    .unwrap_or_else(|e| panic!("{}: bad pattern ({})", spec.name, e));
                assert_eq!(re.captures_len(), 2, "{} needs one capture group", spec.name);
            }
        }
    }
}
