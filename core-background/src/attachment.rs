//! Interactive context attachment.

use crate::error::{BackgroundError, Result};
use bridge_traits::InteractiveContext;

/// Whether a foreground surface able to show OS dialogs is available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attachment {
    #[default]
    Detached,
    Attached(InteractiveContext),
}

impl Attachment {
    /// Attach `context`, returning the one it replaces.
    pub fn attach(&mut self, context: InteractiveContext) -> Option<InteractiveContext> {
        match std::mem::replace(self, Attachment::Attached(context)) {
            Attachment::Attached(previous) => Some(previous),
            Attachment::Detached => None,
        }
    }

    /// Detach, returning the context that was attached.
    pub fn detach(&mut self) -> Option<InteractiveContext> {
        match std::mem::take(self) {
            Attachment::Attached(previous) => Some(previous),
            Attachment::Detached => None,
        }
    }

    pub fn context(&self) -> Option<&InteractiveContext> {
        match self {
            Attachment::Attached(context) => Some(context),
            Attachment::Detached => None,
        }
    }

    /// The attached context, or [`BackgroundError::NoInteractiveContext`].
    pub fn require_context(&self) -> Result<&InteractiveContext> {
        self.context().ok_or(BackgroundError::NoInteractiveContext)
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, Attachment::Attached(_))
    }
}
