//! Discovery strategies
//!
//! Two strategies in priority order:
//! 1. Role - interactive control whose accessible name matches the intent
//! 2. Text - element whose text matches; if it is only a label, the first
//!    control inside its nearest structural container
//!
//! A strategy proposes at most one candidate and has already rejected it if
//! the short visibility probe failed. Final confirmation belongs to the engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use selfheal_core_types::Intent;
use selfheal_primitives::{
    probe_visible, within, AnchorDescriptor, Locatable, MatchMode, SearchScope, TextMatcher,
};
use tracing::debug;

use crate::{
    errors::LocatorError,
    policy::DiscoveryOptions,
    types::{Candidate, MatchRoute, StrategyKind},
};

/// Everything a strategy may consult during one evaluation
pub struct DiscoveryContext<'a> {
    pub page: &'a dyn Locatable,
    pub intent: &'a Intent,
    pub matcher: &'a TextMatcher,
    pub scope: SearchScope,
    pub probe_timeout: Duration,
    pub options: &'a DiscoveryOptions,
}

impl DiscoveryContext<'_> {
    fn text_anchor(&self) -> AnchorDescriptor {
        AnchorDescriptor::Text {
            content: self.intent.as_str().to_string(),
            exact: self.matcher.mode() == MatchMode::Exact,
        }
    }
}

/// Strategy trait for intent-driven discovery
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Get strategy identifier
    fn kind(&self) -> StrategyKind;

    /// Propose at most one visible candidate for the context's intent
    async fn discover(
        &self,
        ctx: &DiscoveryContext<'_>,
    ) -> Result<Option<Candidate>, LocatorError>;
}

/// Built-in chain: role, then text
pub fn default_strategies() -> Vec<Arc<dyn DiscoveryStrategy>> {
    vec![Arc::new(RoleStrategy), Arc::new(TextAncestorStrategy)]
}

/// Role + accessible name strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleStrategy;

#[async_trait]
impl DiscoveryStrategy for RoleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Role
    }

    async fn discover(
        &self,
        ctx: &DiscoveryContext<'_>,
    ) -> Result<Option<Candidate>, LocatorError> {
        let fail = |err| LocatorError::strategy(StrategyKind::Role.name(), err);
        let roles = &ctx.options.control_roles;

        let found = within(
            ctx.probe_timeout,
            "role query",
            ctx.page.find_by_role(&ctx.scope, roles, ctx.matcher),
        )
        .await
        .map_err(fail)?;
        let Some(node) = found else {
            debug!(intent = %ctx.intent, ?roles, "no control with matching name");
            return Ok(None);
        };

        if !probe_visible(ctx.page, &AnchorDescriptor::Node(node), ctx.probe_timeout)
            .await
            .map_err(fail)?
        {
            debug!(%node, "role match not visible");
            return Ok(None);
        }

        let role = match ctx.page.role_of(node).await.map_err(fail)? {
            Some(role) => role,
            None => roles.first().cloned().unwrap_or_else(|| "button".to_string()),
        };
        let suggestion = AnchorDescriptor::Aria {
            role,
            name: ctx.intent.as_str().to_string(),
        };
        Ok(Some(Candidate::direct(
            node,
            StrategyKind::Role,
            suggestion.to_string(),
        )))
    }
}

/// Text content strategy with container climb
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAncestorStrategy;

#[async_trait]
impl DiscoveryStrategy for TextAncestorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Text
    }

    async fn discover(
        &self,
        ctx: &DiscoveryContext<'_>,
    ) -> Result<Option<Candidate>, LocatorError> {
        let fail = |err| LocatorError::strategy(StrategyKind::Text.name(), err);

        let found = within(
            ctx.probe_timeout,
            "text query",
            ctx.page.find_by_text(&ctx.scope, ctx.matcher),
        )
        .await
        .map_err(fail)?;
        let Some(label) = found else {
            debug!(intent = %ctx.intent, "no element with matching text");
            return Ok(None);
        };

        if !probe_visible(ctx.page, &AnchorDescriptor::Node(label), ctx.probe_timeout)
            .await
            .map_err(fail)?
        {
            debug!(%label, "text match not visible");
            return Ok(None);
        }

        let text_anchor = ctx.text_anchor();
        if ctx.page.is_interactive(label).await.map_err(fail)? {
            return Ok(Some(Candidate::direct(
                label,
                StrategyKind::Text,
                text_anchor.to_string(),
            )));
        }

        debug!(%label, pattern = %ctx.options.container, "matched a label, searching its container");
        let Some(container) = ctx
            .page
            .closest_ancestor(label, &ctx.options.container, &ctx.scope)
            .await
            .map_err(fail)?
        else {
            debug!(%label, "label has no structural container");
            return Ok(None);
        };
        let Some(control) = ctx
            .page
            .first_interactive_within(container)
            .await
            .map_err(fail)?
        else {
            debug!(%container, "container holds no control");
            return Ok(None);
        };

        Ok(Some(Candidate {
            node: control,
            strategy: StrategyKind::Text,
            route: MatchRoute::Container { label, container },
            suggestion: format!(
                "{} >> closest({}) >> first-control",
                text_anchor, ctx.options.container
            ),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfheal_primitives::{MemoryPage, ProbeFailure};

    fn ctx<'a>(
        page: &'a MemoryPage,
        intent: &'a Intent,
        matcher: &'a TextMatcher,
        options: &'a DiscoveryOptions,
    ) -> DiscoveryContext<'a> {
        DiscoveryContext {
            page,
            intent,
            matcher,
            scope: SearchScope::Document,
            probe_timeout: Duration::from_secs(1),
            options,
        }
    }

    #[tokio::test]
    async fn role_strategy_suggests_aria_selector() {
        let page = MemoryPage::from_markup(r#"<button aria-label="Submit Form">Go</button>"#);
        let intent = Intent::from("Submit");
        let matcher = TextMatcher::substring("Submit");
        let options = DiscoveryOptions::default();

        let candidate = RoleStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.strategy, StrategyKind::Role);
        assert_eq!(candidate.route, MatchRoute::Direct);
        assert_eq!(candidate.suggestion, "aria:button[name='Submit']");
    }

    #[tokio::test]
    async fn text_strategy_climbs_to_container() {
        let page = MemoryPage::from_markup(
            r#"<table><tr id="r"><td><span>Delete Row 3</span></td><td><button id="rm">Remove</button></td></tr></table>"#,
        );
        let intent = Intent::from("Delete Row 3");
        let matcher = TextMatcher::substring("Delete Row 3");
        let options = DiscoveryOptions::default();

        let candidate = TextAncestorStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.node, page.element_by_id("rm").unwrap());
        match candidate.route {
            MatchRoute::Container { container, .. } => {
                assert_eq!(container, page.element_by_id("r").unwrap())
            }
            MatchRoute::Direct => panic!("expected container route"),
        }
        assert!(candidate.suggestion.starts_with("text:partial:'Delete Row 3'"));
    }

    #[tokio::test]
    async fn text_strategy_without_container_finds_nothing() {
        let page = MemoryPage::from_markup(r#"<p>Orphan label</p><button>Elsewhere</button>"#);
        let intent = Intent::from("Orphan label");
        let matcher = TextMatcher::substring("Orphan label");
        let options = DiscoveryOptions::default();

        let found = TextAncestorStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn backend_failures_name_the_strategy() {
        let page = MemoryPage::from_markup(r#"<button>Submit</button>"#);
        page.fail_probes(Some(ProbeFailure::Timeout));
        let intent = Intent::from("Submit");
        let matcher = TextMatcher::substring("Submit");
        let options = DiscoveryOptions::default();

        let err = RoleStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap_err();
        match err {
            LocatorError::StrategyFailed { strategy, source } => {
                assert_eq!(strategy, "role");
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn role_suggestion_uses_the_matched_role() {
        let page = MemoryPage::from_markup(r#"<nav><a href="/">Home</a></nav><button>Checkout</button>"#);
        let intent = Intent::from("Checkout");
        let matcher = TextMatcher::substring("Checkout");
        let options = DiscoveryOptions {
            control_roles: vec!["link".to_string(), "button".to_string()],
            ..DiscoveryOptions::default()
        };

        let candidate = RoleStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.suggestion, "aria:button[name='Checkout']");

        let intent = Intent::from("Home");
        let matcher = TextMatcher::substring("Home");
        let candidate = RoleStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.suggestion, "aria:link[name='Home']");
    }

    #[tokio::test]
    async fn text_climb_stays_inside_the_search_scope() {
        let page = MemoryPage::from_markup(
            r#"<div class="row"><button id="outside">Outside</button>
                 <form id="f"><span>Newsletter</span></form>
               </div>"#,
        );
        let intent = Intent::from("Newsletter");
        let matcher = TextMatcher::substring("Newsletter");
        let options = DiscoveryOptions::default();

        let mut scoped = ctx(&page, &intent, &matcher, &options);
        scoped.scope = SearchScope::Within(page.element_by_id("f").unwrap());
        let found = TextAncestorStrategy.discover(&scoped).await.unwrap();
        assert!(found.is_none());

        let candidate = TextAncestorStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.node, page.element_by_id("outside").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_visibility_checks_exceed_the_strategy_budget() {
        let page = MemoryPage::from_markup(r#"<button>Submit</button>"#);
        page.delay_probes(Some(Duration::from_millis(1_500)));
        let intent = Intent::from("Submit");
        let matcher = TextMatcher::substring("Submit");
        let options = DiscoveryOptions::default();

        let started = tokio::time::Instant::now();
        let err = RoleStrategy
            .discover(&ctx(&page, &intent, &matcher, &options))
            .await
            .unwrap_err();
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        match err {
            LocatorError::StrategyFailed { strategy, source } => {
                assert_eq!(strategy, "role");
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
