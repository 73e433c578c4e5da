use serde::{Deserialize, Serialize};

/// Abstract label for a page control, mapped per platform to concrete query
/// strategies. Workflows ask for roles, never for raw selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticRole {
    FileInput,
    CoverInput,
    TitleField,
    DescriptionField,
    TagField,
    /// Disclosure control hiding optional fields (e.g. a "Show more"
    /// section with the tag input inside).
    AdvancedToggle,
    SubmitButton,
    LoginIndicator,
    VideoPreview,
    ProgressIndicator,
    SuccessBanner,
    ErrorBanner,
}

impl SemanticRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticRole::FileInput => "file input",
            SemanticRole::CoverInput => "cover input",
            SemanticRole::TitleField => "title field",
            SemanticRole::DescriptionField => "description field",
            SemanticRole::TagField => "tag field",
            SemanticRole::AdvancedToggle => "advanced options toggle",
            SemanticRole::SubmitButton => "submit button",
            SemanticRole::LoginIndicator => "login indicator",
            SemanticRole::VideoPreview => "video preview",
            SemanticRole::ProgressIndicator => "progress indicator",
            SemanticRole::SuccessBanner => "success banner",
            SemanticRole::ErrorBanner => "error banner",
        }
    }
}

impl std::fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of element a role may resolve to. Used by the later, less
/// precise strategies to filter candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Editable,
    Clickable,
    FileInput,
    Any,
}

/// One query strategy. Ordered cheapest and most specific first inside a
/// [`LocatorSpec`]; the later entries intentionally trade precision for
/// recall because the target markup changes without notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Exact CSS selector match.
    CssExact,
    /// `attr*=value` containment over candidate controls.
    AttributeContains,
    /// ARIA role equality or aria-label containment.
    AriaRole,
    /// Visible text match, exact first then containment.
    TextContains,
    /// Server-side scan of every candidate control, scored by keyword
    /// overlap across placeholder/class/id/name/aria-label/text.
    KeywordScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub strategy: Strategy,
    pub pattern: String,
}

impl StrategySpec {
    pub fn new(strategy: Strategy, pattern: impl Into<String>) -> Self {
        Self {
            strategy,
            pattern: pattern.into(),
        }
    }

    pub fn css(pattern: impl Into<String>) -> Self {
        Self::new(Strategy::CssExact, pattern)
    }

    pub fn attribute(pattern: impl Into<String>) -> Self {
        Self::new(Strategy::AttributeContains, pattern)
    }

    pub fn aria(pattern: impl Into<String>) -> Self {
        Self::new(Strategy::AriaRole, pattern)
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        Self::new(Strategy::TextContains, pattern)
    }

    pub fn keywords(pattern: impl Into<String>) -> Self {
        Self::new(Strategy::KeywordScore, pattern)
    }
}

/// Ordered strategy ladder for one semantic role on one platform.
/// Immutable data; adding a platform means adding tables like this, not new
/// control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSpec {
    pub role: SemanticRole,
    pub target: TargetKind,
    pub strategies: Vec<StrategySpec>,
}

impl LocatorSpec {
    pub fn new(role: SemanticRole, target: TargetKind, strategies: Vec<StrategySpec>) -> Self {
        Self {
            role,
            target,
            strategies,
        }
    }
}
