use crate::{
    errors::ActionError,
    matching::TextMatcher,
    types::{AnchorDescriptor, ContainerPattern, NodeId, SearchScope},
};
use async_trait::async_trait;
use std::time::Duration;

/// Capability an automation backend exposes to the recovery engine.
///
/// Queries return the first match in document order. Interaction methods
/// accept any anchor, so the same calls serve the caller's primary
/// reference and the handles discovered during recovery.
#[async_trait]
pub trait Locatable: Send + Sync {
    /// Nearest enclosing container of `anchor` that discovery should stay
    /// inside. Unresolvable anchors yield [`SearchScope::Document`].
    async fn scope_of(&self, anchor: &AnchorDescriptor) -> Result<SearchScope, ActionError>;

    /// First element exposing one of `roles` whose accessible name matches.
    async fn find_by_role(
        &self,
        scope: &SearchScope,
        roles: &[String],
        name: &TextMatcher,
    ) -> Result<Option<NodeId>, ActionError>;

    /// First innermost element whose text content matches.
    async fn find_by_text(
        &self,
        scope: &SearchScope,
        text: &TextMatcher,
    ) -> Result<Option<NodeId>, ActionError>;

    /// Role the node exposes, explicit or implied by its tag.
    async fn role_of(&self, node: NodeId) -> Result<Option<String>, ActionError>;

    /// Whether `target` is rendered and visible, answering within `timeout`.
    async fn is_visible(
        &self,
        target: &AnchorDescriptor,
        timeout: Duration,
    ) -> Result<bool, ActionError>;

    /// Whether the node is an interactive control (button, link, input...).
    async fn is_interactive(&self, node: NodeId) -> Result<bool, ActionError>;

    /// Nearest strict ancestor of `node` matching `pattern`, climbing no
    /// further than the root of `scope`.
    async fn closest_ancestor(
        &self,
        node: NodeId,
        pattern: &ContainerPattern,
        scope: &SearchScope,
    ) -> Result<Option<NodeId>, ActionError>;

    /// First interactive descendant of `container` in document order.
    async fn first_interactive_within(
        &self,
        container: NodeId,
    ) -> Result<Option<NodeId>, ActionError>;

    async fn scroll_into_view(&self, target: &AnchorDescriptor) -> Result<(), ActionError>;

    async fn click(&self, target: &AnchorDescriptor) -> Result<(), ActionError>;

    async fn fill(&self, target: &AnchorDescriptor, value: &str) -> Result<(), ActionError>;
}
