use crate::core::BrowserTrait;
use crate::dom::{DomElement, DomInspector};
use crate::errors::Result;
use crate::locator::{LocatorSpec, Strategy, StrategySpec, TargetKind};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Outcome of a successful locate: a concrete selector the workflow can keep
/// interacting with, plus enough context to pick an interaction technique.
#[derive(Debug, Clone)]
pub struct LocatedElement {
    pub selector: String,
    pub strategy: Strategy,
    pub tag_name: String,
    pub text: Option<String>,
    pub editable: bool,
}

/// Tiered element search.
///
/// Strategies are tried cheapest and most specific first; a markup change
/// that breaks the exact selector typically still satisfies one of the
/// heuristic tiers. Absence is an answer here, not an error: `locate`
/// returns `Ok(None)` when every strategy is exhausted and lets the caller
/// decide whether that is fatal.
pub struct ElementLocator {
    poll_interval: Duration,
}

// Shared JS helpers injected ahead of every in-page probe.
const PROBE_PRELUDE: &str = r#"
    const __visible = (el) => {
        const r = el.getBoundingClientRect();
        if (r.width <= 0 || r.height <= 0) return false;
        const s = window.getComputedStyle(el);
        if (s.visibility === 'hidden' || s.display === 'none') return false;
        return !el.disabled;
    };
    const __cssPath = (el) => {
        if (el.id) return '#' + CSS.escape(el.id);
        const tag = el.tagName.toLowerCase();
        const name = el.getAttribute('name');
        if (name) return tag + "[name='" + name + "']";
        const placeholder = el.getAttribute('placeholder');
        if (placeholder) return tag + "[placeholder='" + placeholder + "']";
        if (el.classList.length > 0) {
            const sel = tag + '.' + Array.from(el.classList).map(c => CSS.escape(c)).join('.');
            if (document.querySelectorAll(sel).length === 1) return sel;
        }
        const parent = el.parentElement;
        if (!parent) return tag;
        const index = Array.from(parent.children).filter(c => c.tagName === el.tagName).indexOf(el) + 1;
        const prefix = parent === document.body ? 'body' : __cssPath(parent);
        return prefix + ' > ' + tag + ':nth-of-type(' + index + ')';
    };
    const __editable = (el) => {
        const tag = el.tagName.toLowerCase();
        if (tag === 'textarea') return true;
        if (tag === 'input') return !['hidden','submit','button','checkbox','radio'].includes(el.type);
        return el.isContentEditable === true;
    };
    const __describe = (matches) => {
        if (matches.length === 0) return { found: false, count: 0 };
        const el = matches[0];
        return {
            found: true,
            count: matches.length,
            selector: __cssPath(el),
            tag: el.tagName.toLowerCase(),
            text: (el.textContent || '').trim().slice(0, 120),
            editable: __editable(el)
        };
    };
"#;

impl ElementLocator {
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            poll_interval: Duration::from_millis(poll_interval_ms.max(50)),
        }
    }

    /// Try every strategy of `spec`, polling until `timeout`.
    ///
    /// A zero timeout performs a single pass over the strategies and returns
    /// immediately. Script failures inside a probe count as "no match" for
    /// that strategy; only transport-level browser errors bubble up.
    pub async fn locate<B: BrowserTrait>(
        &self,
        browser: &B,
        tab: &B::TabHandle,
        spec: &LocatorSpec,
        timeout: Duration,
    ) -> Result<Option<LocatedElement>> {
        let start = Instant::now();
        loop {
            for strategy_spec in &spec.strategies {
                if let Some(found) = self.probe(browser, tab, spec, strategy_spec).await {
                    debug!(
                        "locator: resolved '{}' via {:?} -> {}",
                        spec.role, strategy_spec.strategy, found.selector
                    );
                    return Ok(Some(found));
                }
            }
            if start.elapsed() >= timeout {
                debug!(
                    "locator: '{}' not found after {} strategies within {:?}",
                    spec.role,
                    spec.strategies.len(),
                    timeout
                );
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn probe<B: BrowserTrait>(
        &self,
        browser: &B,
        tab: &B::TabHandle,
        spec: &LocatorSpec,
        strategy_spec: &StrategySpec,
    ) -> Option<LocatedElement> {
        match strategy_spec.strategy {
            Strategy::KeywordScore => {
                self.keyword_fallback(browser, tab, spec, &strategy_spec.pattern)
                    .await
            }
            _ => {
                let script = Self::probe_script(spec.target, strategy_spec)?;
                let value = browser.execute_script(tab, &script).await.ok()?;
                Self::parse_probe_result(&value, strategy_spec.strategy)
            }
        }
    }

    fn parse_probe_result(value: &Value, strategy: Strategy) -> Option<LocatedElement> {
        if !value.get("found")?.as_bool()? {
            return None;
        }
        let selector = value.get("selector")?.as_str()?.to_string();
        let tag_name = value
            .get("tag")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let text = value
            .get("text")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let editable = value
            .get("editable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Some(LocatedElement {
            selector,
            strategy,
            tag_name,
            text,
            editable,
        })
    }

    /// Candidate pool a strategy filters, chosen by the role's target kind.
    fn candidate_selector(target: TargetKind) -> &'static str {
        match target {
            TargetKind::Editable => {
                "input, textarea, [contenteditable='true'], [contenteditable='']"
            }
            TargetKind::Clickable => {
                "button, a, input[type='submit'], input[type='button'], [role='button']"
            }
            TargetKind::FileInput => "input[type='file']",
            TargetKind::Any => "input, textarea, button, select, a, div, span, video, img",
        }
    }

    fn probe_script(target: TargetKind, strategy_spec: &StrategySpec) -> Option<String> {
        // File inputs are routinely hidden behind styled upload areas, so
        // presence alone is enough for them.
        let filter = if target == TargetKind::FileInput {
            "true"
        } else {
            "__visible(el)"
        };
        let pattern_js = serde_json::to_string(&strategy_spec.pattern).ok()?;
        let candidates = Self::candidate_selector(target);

        let body = match strategy_spec.strategy {
            Strategy::CssExact => format!(
                r#"
                const pattern = {pattern_js};
                const matches = Array.from(document.querySelectorAll(pattern))
                    .filter(el => {filter});
                return __describe(matches);
                "#
            ),
            Strategy::AttributeContains => {
                let (attr, value) = strategy_spec.pattern.split_once("*=")?;
                let attr_js = serde_json::to_string(attr).ok()?;
                let value_js = serde_json::to_string(value).ok()?;
                format!(
                    r#"
                    const attr = {attr_js};
                    const needle = {value_js};
                    const matches = Array.from(document.querySelectorAll("{candidates}"))
                        .filter(el => (el.getAttribute(attr) || '').includes(needle))
                        .filter(el => {filter});
                    return __describe(matches);
                    "#
                )
            }
            Strategy::AriaRole => format!(
                r#"
                const needle = {pattern_js};
                const matches = Array.from(document.querySelectorAll("{candidates}"))
                    .filter(el => el.getAttribute('role') === needle
                        || (el.getAttribute('aria-label') || '').includes(needle))
                    .filter(el => {filter});
                return __describe(matches);
                "#
            ),
            Strategy::TextContains => format!(
                r#"
                const needle = {pattern_js};
                const pool = Array.from(document.querySelectorAll("{candidates}"))
                    .filter(el => {filter});
                let matches = pool.filter(el => (el.textContent || '').trim() === needle);
                if (matches.length === 0) {{
                    matches = pool.filter(el => (el.textContent || '').includes(needle));
                }}
                if (matches.length === 0) {{
                    // Last resort: any small element carrying exactly this text.
                    matches = Array.from(document.querySelectorAll('div, span'))
                        .filter(el => (el.textContent || '').trim() === needle)
                        .filter(el => {filter});
                }}
                return __describe(matches);
                "#
            ),
            Strategy::KeywordScore => return None,
        };

        Some(format!(
            "(function() {{ {PROBE_PRELUDE} {body} }})()"
        ))
    }

    /// Structural fallback: pull the page's markup once and rank every
    /// candidate control by keyword overlap. Deliberately imprecise; it is
    /// the tier that survives full markup rewrites.
    async fn keyword_fallback<B: BrowserTrait>(
        &self,
        browser: &B,
        tab: &B::TabHandle,
        spec: &LocatorSpec,
        pattern: &str,
    ) -> Option<LocatedElement> {
        let html_value = browser
            .execute_script(tab, "document.documentElement.outerHTML")
            .await
            .ok()?;
        let html = html_value.as_str()?;
        let candidates = DomInspector::interactive_candidates(html);
        let best = score_candidates(&candidates, spec.target, pattern)?;
        trace!(
            "locator: keyword fallback for '{}' picked {}",
            spec.role,
            best.css_selector
        );
        Some(LocatedElement {
            selector: best.css_selector.clone(),
            strategy: Strategy::KeywordScore,
            tag_name: best.tag_name.clone(),
            text: best.text_content.clone(),
            editable: best.is_editable,
        })
    }
}

fn matches_target(element: &DomElement, target: TargetKind) -> bool {
    match target {
        TargetKind::Editable => element.is_editable,
        TargetKind::Clickable => element.is_clickable,
        TargetKind::FileInput => {
            element.tag_name == "input" && element.attr("type") == Some("file")
        }
        TargetKind::Any => true,
    }
}

/// Pick the best-scoring candidate for a comma-separated keyword list, or
/// `None` when nothing clears the minimum score.
fn score_candidates<'a>(
    candidates: &'a [DomElement],
    target: TargetKind,
    pattern: &str,
) -> Option<&'a DomElement> {
    let keywords: Vec<String> = pattern
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return None;
    }

    let mut best: Option<(i32, &DomElement)> = None;
    for candidate in candidates {
        // File inputs are exempt from the visibility requirement.
        if target != TargetKind::FileInput && !candidate.is_visible {
            continue;
        }
        if !matches_target(candidate, target) {
            continue;
        }
        let haystack = candidate.scoring_haystack();
        let mut score = 0;
        for keyword in &keywords {
            if haystack.contains(keyword) {
                score += 10;
            }
            if candidate
                .text_content
                .as_deref()
                .map(|t| t.trim().to_lowercase() == *keyword)
                .unwrap_or(false)
            {
                score += 15;
            }
        }
        if score >= 10 && best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, el)| el)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::SemanticRole;
    use crate::testing::MockBrowser;
    use serde_json::json;

    fn found_response(selector: &str, tag: &str, text: &str) -> Value {
        json!({
            "found": true,
            "count": 1,
            "selector": selector,
            "tag": tag,
            "text": text,
            "editable": false
        })
    }

    #[tokio::test]
    async fn falls_back_to_later_strategy() {
        // A and B match nothing; only C (text search) hits.
        let browser = MockBrowser::new();
        browser.stub_script("#upload-btn", json!({ "found": false, "count": 0 }));
        browser.stub_script("data-e2e", json!({ "found": false, "count": 0 }));
        browser.stub_script("发布", found_response("button.semi-button-primary", "button", "发布"));
        let tab = browser.new_tab().await.unwrap();

        let spec = LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![
                StrategySpec::css("#upload-btn"),
                StrategySpec::attribute("data-e2e*=submit"),
                StrategySpec::text("发布"),
            ],
        );

        let locator = ElementLocator::new(50);
        let found = locator
            .locate(&browser, &tab, &spec, Duration::ZERO)
            .await
            .unwrap()
            .expect("strategy C should match");
        assert_eq!(found.strategy, Strategy::TextContains);
        assert_eq!(found.selector, "button.semi-button-primary");
    }

    #[tokio::test]
    async fn zero_timeout_returns_none_without_polling() {
        let browser = MockBrowser::new();
        let tab = browser.new_tab().await.unwrap();

        let spec = LocatorSpec::new(
            SemanticRole::TitleField,
            TargetKind::Editable,
            vec![StrategySpec::css("input.title")],
        );

        let locator = ElementLocator::new(50);
        let start = Instant::now();
        let found = locator
            .locate(&browser, &tab, &spec, Duration::ZERO)
            .await
            .unwrap();
        assert!(found.is_none());
        // Exactly one pass, no poll sleeps.
        assert_eq!(browser.script_calls(), 1);
        assert!(start.elapsed() < Duration::from_millis(40));
    }

    #[tokio::test]
    async fn polls_until_timeout_then_gives_up() {
        let browser = MockBrowser::new();
        let tab = browser.new_tab().await.unwrap();

        let spec = LocatorSpec::new(
            SemanticRole::SubmitButton,
            TargetKind::Clickable,
            vec![StrategySpec::css("button.publish")],
        );

        let locator = ElementLocator::new(50);
        let found = locator
            .locate(&browser, &tab, &spec, Duration::from_millis(160))
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(browser.script_calls() >= 2, "should have re-probed");
    }

    #[tokio::test]
    async fn keyword_fallback_scores_page_candidates() {
        let html = r#"
            <html><body>
                <input type="text" placeholder="填写作品标题" class="semi-input">
                <button class="other">cancel</button>
            </body></html>
        "#;
        let browser = MockBrowser::new();
        browser.stub_script("outerHTML", json!(html));
        let tab = browser.new_tab().await.unwrap();

        let spec = LocatorSpec::new(
            SemanticRole::TitleField,
            TargetKind::Editable,
            vec![StrategySpec::keywords("标题,title")],
        );

        let locator = ElementLocator::new(50);
        let found = locator
            .locate(&browser, &tab, &spec, Duration::ZERO)
            .await
            .unwrap()
            .expect("scored candidate");
        assert_eq!(found.strategy, Strategy::KeywordScore);
        assert_eq!(found.selector, "input[placeholder='填写作品标题']");
        assert!(found.editable);
    }

    #[test]
    fn score_requires_target_kind() {
        let html = r#"<html><body><button class="x">标题</button></body></html>"#;
        let candidates = DomInspector::interactive_candidates(html);
        // The button mentions the keyword but is not editable.
        assert!(score_candidates(&candidates, TargetKind::Editable, "标题").is_none());
        assert!(score_candidates(&candidates, TargetKind::Clickable, "标题").is_some());
    }
}
