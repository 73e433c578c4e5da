use super::PlatformSpec;
use crate::locator::{LocatorSpec, SemanticRole, StrategySpec, TargetKind};

pub(crate) fn spec() -> PlatformSpec {
    let mut spec = PlatformSpec::base("douyin", "抖音创作者中心");
    spec.entry_url = "https://creator.douyin.com/creator-micro/content/upload";
    spec.base_url = "https://creator.douyin.com";
    spec.title_limit = 30;
    spec.description_limit = 1000;
    spec.success_url_keywords = &["content/manage", "content/post"];

    spec.with_locators(vec![
        LocatorSpec::new(
            SemanticRole::FileInput,
            TargetKind::FileInput,
            vec![
                StrategySpec::css("input[type='file']"),
                StrategySpec::attribute("accept*=video"),
                StrategySpec::css("div.upload input[type='file']"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::CoverInput,
            TargetKind::FileInput,
            vec![
                StrategySpec::attribute("accept*=image"),
                StrategySpec::css("div.cover input[type='file']"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::TitleField,
            TargetKind::Editable,
            vec![
                StrategySpec::css("input.semi-input"),
                StrategySpec::attribute("placeholder*=标题"),
                StrategySpec::keywords("标题,作品名称"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::DescriptionField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("data-placeholder*=简介"),
                StrategySpec::css(".DraftEditor-editorContainer div[contenteditable='true']"),
                StrategySpec::css("div[contenteditable='true']"),
                StrategySpec::keywords("简介,描述"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::text("发布"),
                StrategySpec::css("button.semi-button-primary"),
                StrategySpec::keywords("发布,立即发布,提交"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::LoginIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::text("登录"),
                StrategySpec::attribute("class*=login"),
                StrategySpec::keywords("登录,扫码"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::VideoPreview,
            TargetKind::Any,
            vec![
                StrategySpec::css("video"),
                StrategySpec::attribute("class*=player"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::ProgressIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::attribute("class*=progress"),
                StrategySpec::text("上传中"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SuccessBanner,
            TargetKind::Any,
            vec![StrategySpec::text("发布成功")],
        ),
        LocatorSpec::new(
            SemanticRole::ErrorBanner,
            TargetKind::Any,
            vec![
                StrategySpec::attribute("class*=semi-toast-error"),
                StrategySpec::text("发布失败"),
            ],
        ),
    ])
}
