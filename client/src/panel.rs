use std::fmt;
use std::rc::Rc;

pub const LOADING_TEXT: &str = "Loading information...";
pub const RETRY_LABEL: &str = "Retry";

/// Result of one lookup attempt as shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoOutcome {
    Loading,
    Success(String),
    Error { message: String, retryable: bool },
}

/// Re-runs the lookup for one region. Handed to the panel together with the
/// error it belongs to, so the UI invokes it directly.
#[derive(Clone)]
pub struct RetryAction {
    region: String,
    run: Rc<dyn Fn()>,
}

impl RetryAction {
    pub fn new(region: impl Into<String>, run: impl Fn() + 'static) -> Self {
        Self {
            region: region.into(),
            run: Rc::new(run),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn invoke(&self) {
        (self.run)();
    }
}

impl fmt::Debug for RetryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAction")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl PartialEq for RetryAction {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region
    }
}

/// Complete content of the info panel. Every render replaces the previous one.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    General(String),
    Region {
        name: String,
        outcome: InfoOutcome,
        retry: Option<RetryAction>,
    },
}

impl PanelView {
    pub fn region_name(&self) -> Option<&str> {
        match self {
            PanelView::General(_) => None,
            PanelView::Region { name, .. } => Some(name),
        }
    }

    /// Text for the description slot of the region template.
    pub fn body_text(&self) -> &str {
        match self {
            PanelView::General(content) => content,
            PanelView::Region { outcome, .. } => match outcome {
                InfoOutcome::Loading => LOADING_TEXT,
                InfoOutcome::Success(body) => body,
                InfoOutcome::Error { message, .. } => message,
            },
        }
    }

    /// CSS state class for the description slot.
    pub fn state_class(&self) -> &'static str {
        match self {
            PanelView::General(_) => "general",
            PanelView::Region { outcome, .. } => match outcome {
                InfoOutcome::Loading => "loading",
                InfoOutcome::Success(_) => "loaded",
                InfoOutcome::Error { .. } => "error",
            },
        }
    }

    pub fn retry(&self) -> Option<&RetryAction> {
        match self {
            PanelView::Region { retry, .. } => retry.as_ref(),
            PanelView::General(_) => None,
        }
    }
}

pub fn render_loading(name: &str) -> PanelView {
    PanelView::Region {
        name: name.to_owned(),
        outcome: InfoOutcome::Loading,
        retry: None,
    }
}

pub fn render_success(name: &str, body: &str) -> PanelView {
    PanelView::Region {
        name: name.to_owned(),
        outcome: InfoOutcome::Success(body.to_owned()),
        retry: None,
    }
}

/// An error is retryable exactly when a retry action is attached.
pub fn render_error(name: &str, message: &str, retry: Option<RetryAction>) -> PanelView {
    PanelView::Region {
        name: name.to_owned(),
        outcome: InfoOutcome::Error {
            message: message.to_owned(),
            retryable: retry.is_some(),
        },
        retry,
    }
}

pub fn render_general(content: &str) -> PanelView {
    PanelView::General(content.to_owned())
}

/// Destination for panel content.
pub trait PanelSink {
    fn show(&self, view: PanelView);
}
