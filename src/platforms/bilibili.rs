use super::PlatformSpec;
use crate::locator::{LocatorSpec, SemanticRole, StrategySpec, TargetKind};

pub(crate) fn spec() -> PlatformSpec {
    let mut spec = PlatformSpec::base("bilibili", "哔哩哔哩创作中心");
    spec.entry_url = "https://member.bilibili.com/platform/upload/video/frame";
    spec.base_url = "https://member.bilibili.com";
    spec.title_limit = 80;
    spec.description_limit = 2000;
    spec.tags_in_description = false;
    spec.success_url_keywords = &["upload-manager", "video/frame?finished"];
    spec.video_id_pattern = Some(r"(BV[0-9A-Za-z]{10})");

    spec.with_locators(vec![
        LocatorSpec::new(
            SemanticRole::FileInput,
            TargetKind::FileInput,
            vec![
                StrategySpec::css("input[type='file']"),
                StrategySpec::attribute("accept*=video"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::CoverInput,
            TargetKind::FileInput,
            vec![
                StrategySpec::attribute("accept*=image"),
                StrategySpec::css("div.cover-upload input[type='file']"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::TitleField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("placeholder*=标题"),
                StrategySpec::css("div.video-title input"),
                StrategySpec::keywords("标题,稿件标题"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::DescriptionField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("placeholder*=简介"),
                StrategySpec::css("div.archive-info-editor div[contenteditable='true']"),
                StrategySpec::keywords("简介,描述"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::TagField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("placeholder*=创建标签"),
                StrategySpec::attribute("placeholder*=标签"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::text("立即投稿"),
                StrategySpec::css("span.submit-add"),
                StrategySpec::keywords("投稿,发布"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::LoginIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::text("登录"),
                StrategySpec::attribute("class*=login-btn"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::VideoPreview,
            TargetKind::Any,
            vec![
                StrategySpec::text("上传完成"),
                StrategySpec::attribute("class*=success"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::ProgressIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::attribute("class*=upload-progress"),
                StrategySpec::text("上传中"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SuccessBanner,
            TargetKind::Any,
            vec![StrategySpec::text("稿件投递成功"), StrategySpec::text("投稿成功")],
        ),
        LocatorSpec::new(
            SemanticRole::ErrorBanner,
            TargetKind::Any,
            vec![StrategySpec::text("投稿失败"), StrategySpec::attribute("class*=error-hint")],
        ),
    ])
}
