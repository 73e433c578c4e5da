use super::PlatformSpec;
use crate::locator::{LocatorSpec, SemanticRole, StrategySpec, TargetKind};

pub(crate) fn spec() -> PlatformSpec {
    let mut spec = PlatformSpec::base("xiaohongshu", "小红书创作服务平台");
    spec.entry_url = "https://creator.xiaohongshu.com/publish/publish";
    spec.base_url = "https://creator.xiaohongshu.com";
    spec.title_limit = 20;
    spec.description_limit = 1000;
    spec.success_url_keywords = &["publish/success", "note-manager"];

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
                StrategySpec::attribute("placeholder*=填写标题"),
                StrategySpec::keywords("标题"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::DescriptionField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("placeholder*=正文"),
                StrategySpec::attribute("placeholder*=添加正文"),
                StrategySpec::css("div[contenteditable='true']"),
                StrategySpec::keywords("正文,描述"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::text("发布"),
                StrategySpec::css("button.publishBtn"),
                StrategySpec::keywords("发布,发布笔记"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::LoginIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::text("登录"),
                StrategySpec::attribute("class*=login"),
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
            vec![StrategySpec::text("发布失败")],
        ),
    ])
}
