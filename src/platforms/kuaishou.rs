use super::PlatformSpec;
use crate::locator::{LocatorSpec, SemanticRole, StrategySpec, TargetKind};

pub(crate) fn spec() -> PlatformSpec {
    let mut spec = PlatformSpec::base("kuaishou", "快手创作者平台");
    spec.entry_url = "https://cp.kuaishou.com/article/publish/video";
    spec.base_url = "https://cp.kuaishou.com";
    spec.title_limit = 50;
    spec.description_limit = 1000;
    spec.success_url_keywords = &["article/manage", "publish/success"];

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
            SemanticRole::TitleField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("placeholder*=标题"),
                StrategySpec::css("input.ant-input"),
                StrategySpec::keywords("标题"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::DescriptionField,
            TargetKind::Editable,
            vec![
                StrategySpec::css("#work-description-edit"),
                StrategySpec::attribute("placeholder*=描述"),
                StrategySpec::css("div[contenteditable='true']"),
                StrategySpec::keywords("描述,简介,作品描述"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::text("发布"),
                StrategySpec::css("button.ant-btn-primary"),
                StrategySpec::keywords("发布,确认发布"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::LoginIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::text("登录"),
                StrategySpec::attribute("class*=qrcode"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::VideoPreview,
            TargetKind::Any,
            vec![StrategySpec::css("video"), StrategySpec::text("上传成功")],
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
            vec![StrategySpec::text("发布失败"), StrategySpec::attribute("class*=error")],
        ),
    ])
}
