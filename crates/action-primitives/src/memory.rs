//! In-memory [`Locatable`] backend
//!
//! Lets the recovery engine and its callers run against a scripted document
//! without a browser. Every interaction is recorded so callers can assert on
//! what was clicked or filled.

use crate::{
    dom::{Document, Dom},
    errors::ActionError,
    locator::Locatable,
    matching::TextMatcher,
    types::{AnchorDescriptor, ContainerPattern, NodeId, SearchScope},
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Interaction performed against a [`MemoryPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Scrolled(NodeId),
    Clicked(NodeId),
    Filled(NodeId, String),
}

/// How lookups misbehave, for exercising failure paths. Applies to role and
/// text queries as well as visibility probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Every lookup reports that it ran out of time
    Timeout,
    /// Every lookup reports a detached execution context
    Detached,
}

const SCOPE_TAGS: &[&str] = &["form", "dialog"];

/// Budget reported by injected query timeouts; queries carry no timeout of their own.
const QUERY_BUDGET: Duration = Duration::from_millis(1000);

pub struct MemoryPage {
    dom: RwLock<Dom>,
    interactions: Mutex<Vec<Interaction>>,
    probe_failure: RwLock<Option<ProbeFailure>>,
    probes: AtomicUsize,
    probe_latency: RwLock<Option<Duration>>,
    action_delay: RwLock<Option<Duration>>,
}

impl MemoryPage {
    pub fn new(dom: Dom) -> Self {
        Self {
            dom: RwLock::new(dom),
            interactions: Mutex::new(Vec::new()),
            probe_failure: RwLock::new(None),
            probes: AtomicUsize::new(0),
            probe_latency: RwLock::new(None),
            action_delay: RwLock::new(None),
        }
    }

    /// Parse an HTML document or fragment. Parsing is error-tolerant, the
    /// way a browser's is.
    pub fn from_markup(markup: &str) -> Self {
        Self::new(Dom::parse(markup))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.read().view(|doc| doc.element_by_id(id))
    }

    pub fn set_hidden(&self, node: NodeId, hidden: bool) {
        self.dom.write().set_hidden(node, hidden);
    }

    pub fn fail_probes(&self, failure: Option<ProbeFailure>) {
        *self.probe_failure.write() = failure;
    }

    /// Make every visibility probe take `latency` before answering. The
    /// page ignores the budget it is handed, like a backend that does not
    /// support one.
    pub fn delay_probes(&self, latency: Option<Duration>) {
        *self.probe_latency.write() = latency;
    }

    /// Make every click and fill take `delay` before touching the document.
    pub fn delay_actions(&self, delay: Option<Duration>) {
        *self.action_delay.write() = delay;
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.interactions.lock().clone()
    }

    pub fn clicked(&self) -> Vec<NodeId> {
        self.interactions
            .lock()
            .iter()
            .filter_map(|i| match i {
                Interaction::Clicked(node) => Some(*node),
                _ => None,
            })
            .collect()
    }

    pub fn value_of(&self, node: NodeId) -> Option<String> {
        self.dom.read().view(|doc| doc.value(node))
    }

    fn record(&self, interaction: Interaction) {
        debug!(?interaction, "memory page interaction");
        self.interactions.lock().push(interaction);
    }

    fn injected_failure(&self, what: &str, timeout: Duration) -> Result<(), ActionError> {
        match *self.probe_failure.read() {
            Some(ProbeFailure::Timeout) => Err(ActionError::WaitTimeout(format!(
                "{} not settled within {}ms",
                what,
                timeout.as_millis()
            ))),
            Some(ProbeFailure::Detached) => Err(ActionError::BackendIo(
                "execution context was destroyed".to_string(),
            )),
            None => Ok(()),
        }
    }

    async fn pause(&self, delay: &RwLock<Option<Duration>>) {
        let delay = *delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Read the document, failing with [`ActionError::StaleNode`] for
    /// handles it does not know.
    fn with_node<R>(
        &self,
        node: NodeId,
        read: impl FnOnce(&Document<'_>) -> R,
    ) -> Result<R, ActionError> {
        self.dom.read().view(|doc| {
            if doc.contains(node) {
                Ok(read(doc))
            } else {
                Err(ActionError::StaleNode(node.to_string()))
            }
        })
    }
}

fn resolve(doc: &Document<'_>, target: &AnchorDescriptor) -> Result<NodeId, ActionError> {
    doc.resolve(target)
        .ok_or_else(|| ActionError::AnchorNotFound(target.to_string()))
}

fn actionable(doc: &Document<'_>, target: &AnchorDescriptor) -> Result<NodeId, ActionError> {
    let node = resolve(doc, target)?;
    if !doc.is_visible(node) {
        return Err(ActionError::NotClickable(format!("{} is not visible", target)));
    }
    if doc.is_disabled(node) {
        return Err(ActionError::NotEnabled(target.to_string()));
    }
    Ok(node)
}

#[async_trait]
impl Locatable for MemoryPage {
    async fn scope_of(&self, anchor: &AnchorDescriptor) -> Result<SearchScope, ActionError> {
        Ok(self.dom.read().view(|doc| {
            let Some(node) = doc.resolve(anchor) else {
                return SearchScope::Document;
            };
            doc.ancestors(node)
                .into_iter()
                .find(|ancestor| {
                    doc.tag(*ancestor)
                        .map(|tag| SCOPE_TAGS.contains(&tag))
                        .unwrap_or(false)
                        || doc.role(*ancestor).as_deref() == Some("dialog")
                })
                .map(SearchScope::Within)
                .unwrap_or_default()
        }))
    }

    async fn find_by_role(
        &self,
        scope: &SearchScope,
        roles: &[String],
        name: &TextMatcher,
    ) -> Result<Option<NodeId>, ActionError> {
        self.injected_failure("role query", QUERY_BUDGET)?;
        Ok(self
            .dom
            .read()
            .view(|doc| doc.find_by_role(scope, roles, name)))
    }

    async fn find_by_text(
        &self,
        scope: &SearchScope,
        text: &TextMatcher,
    ) -> Result<Option<NodeId>, ActionError> {
        self.injected_failure("text query", QUERY_BUDGET)?;
        Ok(self.dom.read().view(|doc| doc.find_by_text(scope, text)))
    }

    async fn role_of(&self, node: NodeId) -> Result<Option<String>, ActionError> {
        self.with_node(node, |doc| doc.role(node))
    }

    async fn is_visible(
        &self,
        target: &AnchorDescriptor,
        timeout: Duration,
    ) -> Result<bool, ActionError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.pause(&self.probe_latency).await;
        self.injected_failure(&format!("visibility of {}", target), timeout)?;
        Ok(self.dom.read().view(|doc| {
            doc.resolve(target)
                .map(|node| doc.is_visible(node))
                .unwrap_or(false)
        }))
    }

    async fn is_interactive(&self, node: NodeId) -> Result<bool, ActionError> {
        self.with_node(node, |doc| doc.is_interactive(node))
    }

    async fn closest_ancestor(
        &self,
        node: NodeId,
        pattern: &ContainerPattern,
        scope: &SearchScope,
    ) -> Result<Option<NodeId>, ActionError> {
        self.with_node(node, |doc| doc.closest_ancestor(node, pattern, scope))
    }

    async fn first_interactive_within(
        &self,
        container: NodeId,
    ) -> Result<Option<NodeId>, ActionError> {
        self.with_node(container, |doc| doc.first_interactive_within(container))
    }

    async fn scroll_into_view(&self, target: &AnchorDescriptor) -> Result<(), ActionError> {
        let node = self.dom.read().view(|doc| resolve(doc, target))?;
        self.record(Interaction::Scrolled(node));
        Ok(())
    }

    async fn click(&self, target: &AnchorDescriptor) -> Result<(), ActionError> {
        self.pause(&self.action_delay).await;
        let node = self.dom.read().view(|doc| actionable(doc, target))?;
        self.record(Interaction::Clicked(node));
        Ok(())
    }

    async fn fill(&self, target: &AnchorDescriptor, value: &str) -> Result<(), ActionError> {
        self.pause(&self.action_delay).await;
        let mut dom = self.dom.write();
        let node = dom.view(|doc| {
            let node = actionable(doc, target)?;
            if doc.is_editable(node) {
                Ok(node)
            } else {
                Err(ActionError::NotEditable(target.to_string()))
            }
        })?;
        dom.set_value(node, value);
        drop(dom);
        self.record(Interaction::Filled(node, value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
        <div class="modal"><form id="signup">
            <input id="email" placeholder="Email"/>
            <button id="send">Send</button>
            <button id="off" disabled>Later</button>
        </form></div>
        <button id="ghost" style="display:none">Ghost</button>
    "#;

    #[tokio::test]
    async fn click_records_visible_enabled_targets() {
        let page = MemoryPage::from_markup(FORM);
        page.click(&AnchorDescriptor::css("#send")).await.unwrap();
        assert_eq!(page.clicked(), vec![page.element_by_id("send").unwrap()]);

        let missing = page.click(&AnchorDescriptor::css("#missingId")).await;
        assert_eq!(
            missing.unwrap_err(),
            ActionError::AnchorNotFound("css:#missingId".into())
        );
        assert!(matches!(
            page.click(&AnchorDescriptor::css("#ghost")).await,
            Err(ActionError::NotClickable(_))
        ));
        assert!(matches!(
            page.click(&AnchorDescriptor::css("#off")).await,
            Err(ActionError::NotEnabled(_))
        ));
    }

    #[tokio::test]
    async fn fill_requires_editable_target() {
        let page = MemoryPage::from_markup(FORM);
        page.fill(&AnchorDescriptor::css("#email"), "a@b.c").await.unwrap();
        let email = page.element_by_id("email").unwrap();
        assert_eq!(page.value_of(email).as_deref(), Some("a@b.c"));
        assert!(matches!(
            page.fill(&AnchorDescriptor::css("#send"), "x").await,
            Err(ActionError::NotEditable(_))
        ));
    }

    #[tokio::test]
    async fn scope_is_nearest_form_or_document() {
        let page = MemoryPage::from_markup(FORM);
        let form = page.element_by_id("signup").unwrap();
        assert_eq!(
            page.scope_of(&AnchorDescriptor::css("#send")).await.unwrap(),
            SearchScope::Within(form)
        );
        assert_eq!(
            page.scope_of(&AnchorDescriptor::css("#ghost")).await.unwrap(),
            SearchScope::Document
        );
        assert_eq!(
            page.scope_of(&AnchorDescriptor::css("#missingId"))
                .await
                .unwrap(),
            SearchScope::Document
        );
    }

    #[tokio::test]
    async fn probe_failures_are_injectable() {
        let page = MemoryPage::from_markup(FORM);
        let send = AnchorDescriptor::css("#send");
        assert!(page.is_visible(&send, Duration::from_secs(1)).await.unwrap());

        page.fail_probes(Some(ProbeFailure::Timeout));
        let err = page
            .is_visible(&send, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        page.fail_probes(Some(ProbeFailure::Detached));
        assert!(matches!(
            page.is_visible(&send, Duration::from_secs(1)).await,
            Err(ActionError::BackendIo(_))
        ));
        assert_eq!(page.probe_count(), 3);

        let matcher = TextMatcher::substring("Send");
        assert!(matches!(
            page.find_by_text(&SearchScope::Document, &matcher).await,
            Err(ActionError::BackendIo(_))
        ));
        page.fail_probes(None);
        assert!(page
            .find_by_text(&SearchScope::Document, &matcher)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn stale_handles_are_rejected() {
        let page = MemoryPage::from_markup(FORM);
        assert!(matches!(
            page.is_interactive(NodeId(10_000)).await,
            Err(ActionError::StaleNode(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_visibility_answers_are_bounded_by_the_caller() {
        let page = MemoryPage::from_markup(FORM);
        page.delay_probes(Some(Duration::from_millis(1_500)));
        let send = AnchorDescriptor::css("#send");

        let err = crate::waiting::probe_visible(&page, &send, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let started = tokio::time::Instant::now();
        let visible = crate::waiting::probe_visible(&page, &send, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(visible);
        assert_eq!(started.elapsed(), Duration::from_millis(1_500));

        page.delay_probes(None);
        let started = tokio::time::Instant::now();
        assert!(page.is_visible(&send, Duration::from_secs(1)).await.unwrap());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn role_of_reports_explicit_and_implicit_roles() {
        let page = MemoryPage::from_markup(FORM);
        let send = page.element_by_id("send").unwrap();
        let email = page.element_by_id("email").unwrap();
        assert_eq!(page.role_of(send).await.unwrap().as_deref(), Some("button"));
        assert_eq!(page.role_of(email).await.unwrap().as_deref(), Some("textbox"));
        assert!(matches!(
            page.role_of(NodeId(10_000)).await,
            Err(ActionError::StaleNode(_))
        ));
    }
}
