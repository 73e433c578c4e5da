use super::PlatformSpec;
use crate::locator::{LocatorSpec, SemanticRole, StrategySpec, TargetKind};

pub(crate) fn spec() -> PlatformSpec {
    let mut spec = PlatformSpec::base("youtube", "YouTube Studio");
    spec.entry_url = "https://studio.youtube.com/channel/UC/videos/upload";
    spec.base_url = "https://studio.youtube.com";
    spec.title_limit = 100;
    spec.description_limit = 5000;
    spec.tags_in_description = false;
    spec.login_url_keywords = &["accounts.google.com", "signin", "login"];
    // Studio lands on /video/<id>/edit once the publish goes through; the
    // upload dialog keeps the entry URL, so nothing shorter is safe here.
    spec.success_url_keywords = &["video/"];
    spec.video_id_pattern = Some(r"/video/([\w-]{11})");

    spec.with_locators(vec![
        LocatorSpec::new(
            SemanticRole::FileInput,
            TargetKind::FileInput,
            vec![
                StrategySpec::css("input[type='file']"),
                StrategySpec::css("#select-files-button input[type='file']"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::CoverInput,
            TargetKind::FileInput,
            vec![
                StrategySpec::css("#file-loader input[type='file']"),
                StrategySpec::attribute("accept*=image"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::TitleField,
            TargetKind::Editable,
            vec![
                StrategySpec::css("#textbox"),
                StrategySpec::aria("Title"),
                StrategySpec::css("ytcp-social-suggestions-textbox div[contenteditable='true']"),
                StrategySpec::keywords("title,标题"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::DescriptionField,
            TargetKind::Editable,
            vec![
                StrategySpec::css("#description-container div[contenteditable='true']"),
                StrategySpec::aria("Description"),
                StrategySpec::keywords("description,tell viewers"),
            ],
        ),
        // The tag input sits behind the collapsed "Show more" section.
        LocatorSpec::new(
            SemanticRole::TagField,
            TargetKind::Editable,
            vec![
                StrategySpec::aria("Tags"),
                StrategySpec::css("#tags-container input"),
                StrategySpec::keywords("tags,标签"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::AdvancedToggle,
            TargetKind::Clickable,
            vec![
                StrategySpec::css("#toggle-button"),
                StrategySpec::text("Show more"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::css("#done-button"),
                StrategySpec::text("Publish"),
                StrategySpec::text("发布"),
                StrategySpec::keywords("publish,done,发布"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::LoginIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::text("Sign in"),
                StrategySpec::attribute("id*=identifierId"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::VideoPreview,
            TargetKind::Any,
            vec![
                StrategySpec::css("#thumbnail-preview"),
                StrategySpec::css("video"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::ProgressIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::attribute("class*=progress"),
                StrategySpec::text("Uploading"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SuccessBanner,
            TargetKind::Any,
            vec![
                StrategySpec::text("Video published"),
                StrategySpec::text("已发布"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::ErrorBanner,
            TargetKind::Any,
            vec![
                StrategySpec::attribute("class*=error-short"),
                StrategySpec::text("Upload failed"),
            ],
        ),
    ])
}
