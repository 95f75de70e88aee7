use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use regioni_shared::{REGION_INFO_PATH, REQUEST_ID_HEADER, RegionInfoRequest, RegionInfoResponse};
use thiserror::Error;

use crate::panel::{PanelSink, RetryAction, render_error, render_loading, render_success};

/// Substrings marking an error message as transient.
pub const RETRYABLE_MARKERS: [&str; 3] = ["timeout", "connect", "try again"];

/// Raw reply of the lookup endpoint, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResponse {
    pub status: u16,
    pub body: String,
    pub request_id: Option<String>,
}

impl LookupResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Remote region lookup. The returned future owns everything it needs.
pub trait InfoService {
    fn lookup(&self, region: &str) -> LocalBoxFuture<'static, Result<LookupResponse, String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("{0}")]
    Application(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        is_retryable(&self.to_string())
    }
}

/// Case-sensitive substring classification of an error message.
pub fn is_retryable(message: &str) -> bool {
    RETRYABLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Turn a transport-level reply into region text or a classified error.
pub fn interpret_response(response: &LookupResponse) -> Result<String, FetchError> {
    let parsed = serde_json::from_str::<RegionInfoResponse>(&response.body);

    if !response.ok() {
        let message = parsed
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
        return Err(FetchError::Http {
            status: response.status,
            message,
        });
    }

    let body = parsed.map_err(|e| FetchError::Application(format!("unreadable response: {e}")))?;
    if let Some(error) = body.error {
        return Err(FetchError::Application(error));
    }
    body.info.ok_or_else(|| {
        FetchError::Application("response carried no region information".to_string())
    })
}

/// How completions that arrive out of order are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaleResponsePolicy {
    /// Every completion paints the panel; the last one to arrive wins.
    #[default]
    LastCompletionWins,
    /// Only the most recently issued lookup may paint its result.
    LatestIssueWins,
}

/// Schedules a future on the UI event loop.
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

/// Loading → lookup → success/error (+ retry) protocol for one region at a time.
pub struct InfoPipeline<I, P> {
    service: Rc<I>,
    panel: Rc<P>,
    spawner: Spawner,
    policy: StaleResponsePolicy,
    issued: Rc<Cell<u64>>,
}

impl<I, P> Clone for InfoPipeline<I, P> {
    fn clone(&self) -> Self {
        Self {
            service: Rc::clone(&self.service),
            panel: Rc::clone(&self.panel),
            spawner: Rc::clone(&self.spawner),
            policy: self.policy,
            issued: Rc::clone(&self.issued),
        }
    }
}

impl<I, P> InfoPipeline<I, P>
where
    I: InfoService + 'static,
    P: PanelSink + 'static,
{
    pub fn new(service: Rc<I>, panel: Rc<P>, spawner: Spawner) -> Self {
        Self {
            service,
            panel,
            spawner,
            policy: StaleResponsePolicy::default(),
            issued: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_policy(mut self, policy: StaleResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn panel(&self) -> &Rc<P> {
        &self.panel
    }

    /// Outstanding lookups become stale. Under `LatestIssueWins` their
    /// results are dropped.
    pub fn invalidate(&self) {
        self.issued.set(self.issued.get().wrapping_add(1));
    }

    /// Show the loading state now and schedule the lookup.
    pub fn fetch(&self, region: &str) {
        let ticket = self.issued.get().wrapping_add(1);
        self.issued.set(ticket);

        self.panel.show(render_loading(region));

        let pipeline = self.clone();
        let region = region.to_owned();
        (self.spawner)(Box::pin(async move {
            pipeline.complete(region, ticket).await;
        }));
    }

    async fn complete(self, region: String, ticket: u64) {
        let outcome = match self.service.lookup(&region).await {
            Ok(response) => {
                let outcome = interpret_response(&response);
                if let (Err(e), Some(request_id)) = (&outcome, &response.request_id) {
                    log::debug!("lookup for {region} failed ({REQUEST_ID_HEADER}: {request_id}): {e}");
                }
                outcome
            }
            Err(e) => Err(FetchError::Transport(e)),
        };

        if self.policy == StaleResponsePolicy::LatestIssueWins && ticket != self.issued.get() {
            log::debug!("dropping stale lookup result for {region}");
            return;
        }

        match outcome {
            Ok(info) => self.panel.show(render_success(&region, &info)),
            Err(e) => {
                let message = e.to_string();
                log::error!("region info lookup for {region} failed: {message}");
                let retry = e.is_retryable().then(|| self.retry_action(&region));
                self.panel.show(render_error(&region, &message, retry));
            }
        }
    }

    fn retry_action(&self, region: &str) -> RetryAction {
        let pipeline = self.clone();
        let target = region.to_owned();
        RetryAction::new(region, move || pipeline.fetch(&target))
    }
}

/// Lookup over HTTP against the info service.
#[derive(Debug, Clone)]
pub struct HttpInfoService {
    endpoint: String,
}

impl Default for HttpInfoService {
    fn default() -> Self {
        Self::new(REGION_INFO_PATH)
    }
}

impl HttpInfoService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl InfoService for HttpInfoService {
    fn lookup(&self, region: &str) -> LocalBoxFuture<'static, Result<LookupResponse, String>> {
        let endpoint = self.endpoint.clone();
        let payload = RegionInfoRequest {
            region: region.to_owned(),
        };
        Box::pin(async move {
            let resp = gloo_net::http::Request::post(&endpoint)
                .json(&payload)
                .map_err(|e| format!("request error: {e}"))?
                .send()
                .await
                .map_err(|e| format!("fetch error: {e}"))?;

            let status = resp.status();
            let request_id = resp.headers().get(REQUEST_ID_HEADER);
            let body = resp
                .text()
                .await
                .map_err(|e| format!("fetch error: {e}"))?;

            Ok(LookupResponse {
                status,
                body,
                request_id,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::LocalPool;

    use super::*;
    use crate::panel::{InfoOutcome, PanelView};
    use crate::testing::{RecordingPanel, ScriptedService, local_spawner};

    fn response(status: u16, body: &str) -> LookupResponse {
        LookupResponse {
            status,
            body: body.to_string(),
            request_id: None,
        }
    }

    fn pipeline(
        pool: &LocalPool,
    ) -> (
        InfoPipeline<ScriptedService, RecordingPanel>,
        Rc<ScriptedService>,
        Rc<RecordingPanel>,
    ) {
        let service = Rc::new(ScriptedService::default());
        let panel = Rc::new(RecordingPanel::default());
        let pipeline = InfoPipeline::new(service.clone(), panel.clone(), local_spawner(pool));
        (pipeline, service, panel)
    }

    #[test]
    fn retryable_markers_are_case_sensitive_substrings() {
        assert!(is_retryable("upstream request timeout"));
        assert!(is_retryable("could not connect to the info service"));
        assert!(is_retryable("please try again"));
        assert!(!is_retryable("Please Try Again"));
        assert!(!is_retryable("Timeout"));
        assert!(!is_retryable("HTTP error! status: 404"));
    }

    #[test]
    fn interpret_success_returns_info() {
        assert_eq!(
            interpret_response(&response(200, r#"{"info":"Capital region"}"#)),
            Ok("Capital region".to_string())
        );
    }

    #[test]
    fn interpret_application_error_on_success_status() {
        assert_eq!(
            interpret_response(&response(200, r#"{"error":"model unavailable"}"#)),
            Err(FetchError::Application("model unavailable".into()))
        );
    }

    #[test]
    fn interpret_error_status_prefers_body_message() {
        let err = interpret_response(&response(500, r#"{"error":"please try again"}"#))
            .expect_err("500 is an error");
        assert_eq!(
            err,
            FetchError::Http {
                status: 500,
                message: "please try again".into()
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn interpret_error_status_falls_back_to_status_message() {
        let err = interpret_response(&response(404, "<html>Not Found</html>"))
            .expect_err("404 is an error");
        assert_eq!(err.to_string(), "HTTP error! status: 404");
        assert!(!err.is_retryable());

        let err = interpret_response(&response(502, r#"{"info":"odd"}"#)).expect_err("502");
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[test]
    fn interpret_unreadable_success_body_is_an_error() {
        assert!(matches!(
            interpret_response(&response(200, "not json")),
            Err(FetchError::Application(_))
        ));
        assert!(matches!(
            interpret_response(&response(200, "{}")),
            Err(FetchError::Application(_))
        ));
    }

    #[test]
    fn loading_is_rendered_before_the_lookup_resolves() {
        let mut pool = LocalPool::new();
        let (pipeline, service, panel) = pipeline(&pool);

        pipeline.fetch("Lazio");
        assert_eq!(panel.last(), Some(render_loading("Lazio")));

        pool.run_until_stalled();
        assert_eq!(service.calls(), vec!["Lazio".to_string()]);
        assert_eq!(panel.last(), Some(render_loading("Lazio")));

        service.resolve("Lazio", Ok(response(200, r#"{"info":"Capital region"}"#)));
        pool.run_until_stalled();
        assert_eq!(panel.last(), Some(render_success("Lazio", "Capital region")));
    }

    #[test]
    fn transport_failures_are_classified_by_message() {
        let mut pool = LocalPool::new();
        let (pipeline, service, panel) = pipeline(&pool);

        pipeline.fetch("Molise");
        pool.run_until_stalled();
        service.resolve("Molise", Err("fetch error: could not connect".into()));
        pool.run_until_stalled();

        let view = panel.last().expect("panel painted");
        assert!(matches!(
            &view,
            PanelView::Region {
                outcome: InfoOutcome::Error { retryable: true, message },
                ..
            } if message == "fetch error: could not connect"
        ));

        pipeline.fetch("Puglia");
        pool.run_until_stalled();
        service.resolve("Puglia", Err("fetch error: blocked by client".into()));
        pool.run_until_stalled();
        assert!(panel.last().expect("panel painted").retry().is_none());
    }

    #[test]
    fn retry_repeats_the_whole_protocol_for_the_same_region() {
        let mut pool = LocalPool::new();
        let (pipeline, service, panel) = pipeline(&pool);

        pipeline.fetch("Sicilia");
        pool.run_until_stalled();
        service.resolve("Sicilia", Ok(response(500, r#"{"error":"please try again"}"#)));
        pool.run_until_stalled();

        let retry = panel
            .last()
            .and_then(|view| view.retry().cloned())
            .expect("retry offered");
        assert_eq!(retry.region(), "Sicilia");

        retry.invoke();
        assert_eq!(panel.last(), Some(render_loading("Sicilia")));
        pool.run_until_stalled();
        assert_eq!(service.calls(), vec!["Sicilia".to_string(), "Sicilia".to_string()]);

        service.resolve("Sicilia", Ok(response(200, r#"{"info":"Island region"}"#)));
        pool.run_until_stalled();
        assert_eq!(panel.last(), Some(render_success("Sicilia", "Island region")));
    }

    #[test]
    fn last_completion_wins_by_default() {
        let mut pool = LocalPool::new();
        let (pipeline, service, panel) = pipeline(&pool);

        pipeline.fetch("Lazio");
        pipeline.fetch("Umbria");
        pool.run_until_stalled();

        service.resolve("Umbria", Ok(response(200, r#"{"info":"Green heart"}"#)));
        pool.run_until_stalled();
        service.resolve("Lazio", Ok(response(200, r#"{"info":"Capital region"}"#)));
        pool.run_until_stalled();

        assert_eq!(panel.last(), Some(render_success("Lazio", "Capital region")));
    }

    #[test]
    fn latest_issue_policy_drops_stale_completions() {
        let mut pool = LocalPool::new();
        let (pipeline, service, panel) = pipeline(&pool);
        let pipeline = pipeline.with_policy(StaleResponsePolicy::LatestIssueWins);

        pipeline.fetch("Lazio");
        pipeline.fetch("Umbria");
        pool.run_until_stalled();

        service.resolve("Umbria", Ok(response(200, r#"{"info":"Green heart"}"#)));
        pool.run_until_stalled();
        let painted = panel.count();
        service.resolve("Lazio", Ok(response(200, r#"{"info":"Capital region"}"#)));
        pool.run_until_stalled();

        assert_eq!(panel.count(), painted);
        assert_eq!(panel.last(), Some(render_success("Umbria", "Green heart")));
    }
}
