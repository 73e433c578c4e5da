use super::PlatformSpec;
use crate::locator::{LocatorSpec, SemanticRole, StrategySpec, TargetKind};

pub(crate) fn spec() -> PlatformSpec {
    let mut spec = PlatformSpec::base("wechat", "微信视频号");
    spec.entry_url = "https://channels.weixin.qq.com/platform/post/create";
    spec.base_url = "https://channels.weixin.qq.com";
    spec.title_limit = 30;
    spec.description_limit = 600;
    spec.success_url_keywords = &["post/list", "platform/home"];

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
                StrategySpec::attribute("placeholder*=请输入标题"),
                StrategySpec::keywords("标题"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::DescriptionField,
            TargetKind::Editable,
            vec![
                StrategySpec::attribute("placeholder*=描述"),
                StrategySpec::attribute("placeholder*=简介"),
                StrategySpec::css("div.input-editor[contenteditable='true']"),
                StrategySpec::keywords("描述,简介"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::text("发表"),
                StrategySpec::text("发布"),
                StrategySpec::css("button.weui-desktop-btn_primary"),
                StrategySpec::keywords("发表,发布"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::LoginIndicator,
            TargetKind::Any,
            vec![
                StrategySpec::text("登录"),
                StrategySpec::attribute("class*=qrcode"),
                StrategySpec::keywords("登录,扫码"),
            ],
        ),
        LocatorSpec::new(
            SemanticRole::VideoPreview,
            TargetKind::Any,
            vec![StrategySpec::css("video"), StrategySpec::attribute("class*=preview")],
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
            vec![StrategySpec::text("发表成功"), StrategySpec::text("发布成功")],
        ),
        LocatorSpec::new(
            SemanticRole::ErrorBanner,
            TargetKind::Any,
            vec![StrategySpec::text("发表失败"), StrategySpec::attribute("class*=weui-desktop-toast_warn")],
        ),
    ])
}
