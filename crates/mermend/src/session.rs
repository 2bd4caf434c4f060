//! Latest-wins render session.
//!
//! Every submission (and every cancel) issues a fresh [`RenderToken`]. A render result is
//! applied only if its token is still the latest one when the render completes; anything older
//! is reported as [`Submitted::Superseded`] and leaves the session state untouched.
//!
//! The session is single-threaded and executor-agnostic: state lives in `Cell`/`RefCell` and is
//! never borrowed across the awaited render call.

use mermend_core::{DiagramKind, Engine, fallback};
use std::cell::{Cell, RefCell};
use std::future::Future;

pub type RenderToken = u64;

/// The external rendering call. Timeouts, if any, are the implementation's business and are
/// reported as errors.
pub trait RenderEngine {
    type Artifact: Clone;
    type Error: std::error::Error + 'static;

    fn render(&self, text: &str) -> impl Future<Output = Result<Self::Artifact, Self::Error>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<A> {
    Rendered { artifact: A, used_fallback: bool },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState<A> {
    Idle,
    Rendering(RenderToken),
    Settled(RenderToken, Settlement<A>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered<A> {
    pub token: RenderToken,
    pub artifact: A,
    /// Whether `text` is the fallback skeleton rather than the repaired submission.
    pub used_fallback: bool,
    /// The text that was actually rendered.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted<A> {
    Rendered(Rendered<A>),
    /// A newer submission or a cancel overtook this one; its result was discarded.
    Superseded { token: RenderToken },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E>
where
    E: std::error::Error + 'static,
{
    /// The prepared text failed to render and so did the fallback retry.
    #[error("render failed (token {token}) and the fallback retry failed too: {source}")]
    Render {
        token: RenderToken,
        first: E,
        #[source]
        source: E,
    },
}

impl<E> SessionError<E>
where
    E: std::error::Error + 'static,
{
    pub fn token(&self) -> RenderToken {
        match self {
            Self::Render { token, .. } => *token,
        }
    }
}

pub struct RenderSession<R: RenderEngine> {
    engine: Engine,
    renderer: R,
    latest: Cell<RenderToken>,
    state: RefCell<SessionState<R::Artifact>>,
}

impl<R: RenderEngine> RenderSession<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            engine: Engine::default(),
            renderer,
            latest: Cell::new(0),
            state: RefCell::new(SessionState::Idle),
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn latest_token(&self) -> RenderToken {
        self.latest.get()
    }

    pub fn state(&self) -> SessionState<R::Artifact> {
        self.state.borrow().clone()
    }

    fn issue(&self) -> RenderToken {
        let token = self.latest.get() + 1;
        self.latest.set(token);
        token
    }

    fn is_latest(&self, token: RenderToken) -> bool {
        self.latest.get() == token
    }

    /// Invalidates any in-flight render. Its result, when it arrives, is discarded.
    pub fn cancel(&self) {
        let token = self.issue();
        tracing::debug!(token, "render session cancelled");
        self.state.replace(SessionState::Idle);
    }

    fn settle_rendered(
        &self,
        token: RenderToken,
        artifact: R::Artifact,
        used_fallback: bool,
        text: String,
    ) -> Submitted<R::Artifact> {
        if !self.is_latest(token) {
            tracing::debug!(token, latest = self.latest.get(), "discarding superseded render");
            return Submitted::Superseded { token };
        }
        self.state.replace(SessionState::Settled(
            token,
            Settlement::Rendered {
                artifact: artifact.clone(),
                used_fallback,
            },
        ));
        Submitted::Rendered(Rendered {
            token,
            artifact,
            used_fallback,
            text,
        })
    }

    fn settle_failed(&self, token: RenderToken, error: &R::Error) {
        self.state.replace(SessionState::Settled(
            token,
            Settlement::Failed {
                message: error.to_string(),
            },
        ));
    }

    /// Runs `text` through the repair pipeline, renders the result, and on failure retries once
    /// with [`fallback`] under a fresh token.
    ///
    /// `kind` is only a hint for replies that carry no diagram keyword; pass
    /// [`DiagramKind::Unknown`] to rely on detection alone.
    ///
    /// Returns [`Submitted::Superseded`] when a newer submission or a [`cancel`](Self::cancel)
    /// arrived first; stale failures are discarded the same way and never retried.
    pub async fn submit(
        &self,
        text: &str,
        kind: DiagramKind,
    ) -> Result<Submitted<R::Artifact>, SessionError<R::Error>> {
        let token = self.issue();
        self.state.replace(SessionState::Rendering(token));

        let processed = self.engine.process_sync(text, Some(kind));
        let kind = processed.kind;
        if processed.used_fallback {
            tracing::debug!(
                token,
                kind = %kind,
                errors = processed.outcome.errors().len(),
                "submitting fallback diagram"
            );
        }

        let result = self.renderer.render(&processed.text).await;
        let first = match result {
            Ok(artifact) => {
                return Ok(self.settle_rendered(
                    token,
                    artifact,
                    processed.used_fallback,
                    processed.text,
                ));
            }
            Err(err) => err,
        };
        if !self.is_latest(token) {
            tracing::debug!(token, error = %first, "discarding superseded render failure");
            return Ok(Submitted::Superseded { token });
        }
        tracing::warn!(token, kind = %kind, error = %first, "render failed");

        let retry = self.issue();
        self.state.replace(SessionState::Rendering(retry));
        let skeleton = fallback(kind);
        let result = self.renderer.render(skeleton).await;
        match result {
            Ok(artifact) => Ok(self.settle_rendered(retry, artifact, true, skeleton.to_string())),
            Err(err) => {
                if !self.is_latest(retry) {
                    tracing::debug!(token = retry, error = %err, "discarding superseded render failure");
                    return Ok(Submitted::Superseded { token: retry });
                }
                tracing::warn!(token = retry, kind = %kind, error = %err, "fallback render failed");
                self.settle_failed(retry, &err);
                Err(SessionError::Render {
                    token: retry,
                    first,
                    source: err,
                })
            }
        }
    }
}
