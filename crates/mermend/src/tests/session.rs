use crate::session::*;
use crate::{DiagramKind, fallback};
use futures::channel::oneshot;
use futures::executor::block_on;
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("renderer rejected diagram: {0}")]
struct RenderFailure(&'static str);

type Reply = Result<String, RenderFailure>;

/// Renderer whose replies are scripted through oneshot channels, one per call.
#[derive(Default)]
struct ScriptedRenderer {
    replies: RefCell<VecDeque<oneshot::Receiver<Reply>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRenderer {
    fn expect_call(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(rx);
        tx
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl RenderEngine for ScriptedRenderer {
    type Artifact = String;
    type Error = RenderFailure;

    async fn render(&self, text: &str) -> Result<String, RenderFailure> {
        self.calls.borrow_mut().push(text.to_string());
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .expect("unexpected render call");
        reply.await.expect("reply sender dropped")
    }
}

#[test]
fn new_session_is_idle() {
    let session = RenderSession::new(ScriptedRenderer::default());
    assert_eq!(session.latest_token(), 0);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn submit_renders_repaired_text() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Ok("<svg/>".to_string()))
        .unwrap();

    let submitted = block_on(session.submit("sequenceDiagram\n->>B: hi", DiagramKind::Sequence));
    let expected_text = "sequenceDiagram\nparticipant Actor1\nparticipant B\nActor1->>B: hi";
    assert_eq!(
        submitted.unwrap(),
        Submitted::Rendered(Rendered {
            token: 1,
            artifact: "<svg/>".to_string(),
            used_fallback: false,
            text: expected_text.to_string(),
        })
    );
    assert_eq!(session.renderer().calls(), [expected_text]);
    assert_eq!(
        session.state(),
        SessionState::Settled(
            1,
            Settlement::Rendered {
                artifact: "<svg/>".to_string(),
                used_fallback: false,
            }
        )
    );
}

#[test]
fn submit_detects_kind_when_caller_passes_unknown() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Ok("ok".to_string()))
        .unwrap();

    let submitted = block_on(session.submit("graph TD\nA B", DiagramKind::Unknown)).unwrap();
    let Submitted::Rendered(rendered) = submitted else {
        panic!("expected a rendered result");
    };
    assert_eq!(rendered.text, "graph TD\nA --> B");
    assert!(!rendered.used_fallback);
}

#[test]
fn newer_submission_supersedes_older_one() {
    let session = RenderSession::new(ScriptedRenderer::default());
    let first_reply = session.renderer().expect_call();
    let second_reply = session.renderer().expect_call();

    let first = session.submit("graph TD\nA-->B", DiagramKind::Flowchart);
    let second = session.submit("graph TD\nB-->C", DiagramKind::Flowchart);
    let replies = async {
        second_reply.send(Ok("second".to_string())).unwrap();
        first_reply.send(Ok("first".to_string())).unwrap();
    };
    let (first, second, ()) = block_on(async { futures::join!(first, second, replies) });

    assert_eq!(first.unwrap(), Submitted::Superseded { token: 1 });
    let Submitted::Rendered(rendered) = second.unwrap() else {
        panic!("latest submission should render");
    };
    assert_eq!(rendered.token, 2);
    assert_eq!(rendered.artifact, "second");
    assert_eq!(
        session.state(),
        SessionState::Settled(
            2,
            Settlement::Rendered {
                artifact: "second".to_string(),
                used_fallback: false,
            }
        )
    );
}

#[test]
fn render_failure_retries_once_with_fallback() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Err(RenderFailure("bad syntax")))
        .unwrap();
    session
        .renderer()
        .expect_call()
        .send(Ok("fallback-svg".to_string()))
        .unwrap();

    let submitted = block_on(session.submit("graph TD\nA-->B", DiagramKind::Flowchart)).unwrap();
    assert_eq!(
        submitted,
        Submitted::Rendered(Rendered {
            token: 2,
            artifact: "fallback-svg".to_string(),
            used_fallback: true,
            text: fallback(DiagramKind::Flowchart).to_string(),
        })
    );
    assert_eq!(
        session.renderer().calls(),
        ["graph TD\nA-->B", fallback(DiagramKind::Flowchart)]
    );
    assert_eq!(session.latest_token(), 2);
}

#[test]
fn second_render_failure_is_surfaced() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Err(RenderFailure("first")))
        .unwrap();
    session
        .renderer()
        .expect_call()
        .send(Err(RenderFailure("second")))
        .unwrap();

    let err = block_on(session.submit("graph TD\nA-->B", DiagramKind::Flowchart)).unwrap_err();
    assert_eq!(err.token(), 2);
    let SessionError::Render { first, source, .. } = &err;
    assert_eq!(first, &RenderFailure("first"));
    assert_eq!(source, &RenderFailure("second"));
    assert_eq!(
        err.to_string(),
        "render failed (token 2) and the fallback retry failed too: renderer rejected diagram: second"
    );
    assert_eq!(
        session.state(),
        SessionState::Settled(
            2,
            Settlement::Failed {
                message: "renderer rejected diagram: second".to_string(),
            }
        )
    );
}

#[test]
fn invalid_submission_still_gets_a_fallback_retry() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Err(RenderFailure("timeout")))
        .unwrap();
    session
        .renderer()
        .expect_call()
        .send(Ok("fallback-svg".to_string()))
        .unwrap();

    let submitted =
        block_on(session.submit("graph TD\nthis is bad\nalso bad!", DiagramKind::Flowchart))
            .unwrap();
    let skeleton = fallback(DiagramKind::Flowchart);
    assert_eq!(
        submitted,
        Submitted::Rendered(Rendered {
            token: 2,
            artifact: "fallback-svg".to_string(),
            used_fallback: true,
            text: skeleton.to_string(),
        })
    );
    assert_eq!(session.renderer().calls(), [skeleton, skeleton]);
}

#[test]
fn submit_extracts_diagram_from_chat_reply() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Ok("ok".to_string()))
        .unwrap();

    let submitted = block_on(session.submit(
        "Here you go:\n```mermaid\ngraph TD\nA-->B\n```",
        DiagramKind::Flowchart,
    ))
    .unwrap();
    let Submitted::Rendered(rendered) = submitted else {
        panic!("expected a rendered result");
    };
    assert_eq!(rendered.text, "graph TD\nA-->B");
    assert!(!rendered.used_fallback);
    assert_eq!(session.renderer().calls(), ["graph TD\nA-->B"]);
}

#[test]
fn submit_converts_legacy_flowchart() {
    let session = RenderSession::new(ScriptedRenderer::default());
    session
        .renderer()
        .expect_call()
        .send(Ok("ok".to_string()))
        .unwrap();

    let submitted = block_on(session.submit(
        "st=>start: Start\nop=>operation: Do\nst->op",
        DiagramKind::Flowchart,
    ))
    .unwrap();
    let Submitted::Rendered(rendered) = submitted else {
        panic!("expected a rendered result");
    };
    assert_eq!(rendered.text, "flowchart TD\nst([Start])\nop[Do]\nst --> op");
    assert!(!rendered.used_fallback);
}

#[test]
fn stale_failure_is_discarded_without_retry() {
    let session = RenderSession::new(ScriptedRenderer::default());
    let first_reply = session.renderer().expect_call();
    let second_reply = session.renderer().expect_call();

    let first = session.submit("graph TD\nA-->B", DiagramKind::Flowchart);
    let second = session.submit("graph TD\nB-->C", DiagramKind::Flowchart);
    let replies = async {
        first_reply.send(Err(RenderFailure("late"))).unwrap();
        second_reply.send(Ok("second".to_string())).unwrap();
    };
    let (first, second, ()) = block_on(async { futures::join!(first, second, replies) });

    assert_eq!(first.unwrap(), Submitted::Superseded { token: 1 });
    assert!(matches!(second.unwrap(), Submitted::Rendered(Rendered { token: 2, .. })));
    assert_eq!(session.renderer().calls().len(), 2);
}

#[test]
fn cancel_discards_in_flight_render() {
    let session = RenderSession::new(ScriptedRenderer::default());
    let reply = session.renderer().expect_call();

    let pending = session.submit("graph TD\nA-->B", DiagramKind::Flowchart);
    let cancel = async {
        session.cancel();
        reply.send(Ok("too late".to_string())).unwrap();
    };
    let (pending, ()) = block_on(async { futures::join!(pending, cancel) });

    assert_eq!(pending.unwrap(), Submitted::Superseded { token: 1 });
    assert_eq!(session.latest_token(), 2);
    assert_eq!(session.state(), SessionState::Idle);
}
