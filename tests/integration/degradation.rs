#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use rescuenet::{
    error::BackendError,
    graph::{
        AccessMode, BackendSession, ConnectionMode, GraphBackend, GraphClient, MockGenerator,
        Params, Record, RecordSet, Value,
    },
};
use tokio::sync::Barrier;

/// Outcome of one scripted backend interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Ok,
    OpenFails,
    RunFails,
    CommitFails,
    CloseFails,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Ok),
        1 => Just(Step::OpenFails),
        1 => Just(Step::RunFails),
        1 => Just(Step::CommitFails),
        1 => Just(Step::CloseFails),
    ]
}

#[derive(Default)]
struct Spy {
    opened: AtomicUsize,
    ran: AtomicUsize,
    closed: AtomicUsize,
}

struct ScriptedBackend {
    script: Mutex<Vec<Step>>,
    spy: Arc<Spy>,
    rendezvous: Option<Arc<Barrier>>,
}

impl ScriptedBackend {
    fn new(script: Vec<Step>) -> (Arc<Self>, Arc<Spy>) {
        Self::build(script, None)
    }

    /// Every session waits in `run` until `callers` sessions are running.
    fn concurrent(script: Vec<Step>, callers: usize) -> (Arc<Self>, Arc<Spy>) {
        Self::build(script, Some(Arc::new(Barrier::new(callers))))
    }

    fn build(mut script: Vec<Step>, rendezvous: Option<Arc<Barrier>>) -> (Arc<Self>, Arc<Spy>) {
        let spy = Arc::new(Spy::default());
        script.reverse();
        let backend = Arc::new(Self {
            script: Mutex::new(script),
            spy: spy.clone(),
            rendezvous,
        });
        (backend, spy)
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .expect("script lock")
            .pop()
            .unwrap_or(Step::Ok)
    }
}

struct ScriptedSession {
    step: Step,
    spy: Arc<Spy>,
    rendezvous: Option<Arc<Barrier>>,
}

#[async_trait]
impl GraphBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open_session(&self, _mode: AccessMode) -> Result<Box<dyn BackendSession>, BackendError> {
        let step = self.next_step();
        if step == Step::OpenFails {
            return Err(BackendError::SessionOpen("connection refused".into()));
        }
        self.spy.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            step,
            spy: self.spy.clone(),
            rendezvous: self.rendezvous.clone(),
        }))
    }
}

#[async_trait]
impl BackendSession for ScriptedSession {
    async fn run(&mut self, _query: &str, _params: &Params) -> Result<RecordSet, BackendError> {
        self.spy.ran.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        match self.step {
            Step::RunFails => return Err(BackendError::Query("ServiceUnavailable".into())),
            // Rows were produced but the statement's transaction did not commit.
            Step::CommitFails => {
                return Err(BackendError::Query(
                    "commit failed: ConstraintValidationFailed".into(),
                ))
            }
            _ => {}
        }
        Ok(RecordSet::new(vec![Record::from_pairs([(
            "origin",
            Value::from("backend"),
        )])]))
    }

    async fn close(self: Box<Self>) -> Result<(), BackendError> {
        self.spy.closed.fetch_add(1, Ordering::SeqCst);
        if self.step == Step::CloseFails {
            return Err(BackendError::Close("broken pipe".into()));
        }
        Ok(())
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime")
}

const TEAM_QUERY: &str = "MATCH (t1:Team)-[r:COORDINATES_WITH]->(t2:Team) RETURN t1.name AS team1";
const PATH_QUERY: &str = "MATCH path = shortestPath((a)-[*..5]-(b)) RETURN length(path)";

proptest! {
    #[test]
    fn degradation_is_permanent(script in prop::collection::vec(arb_step(), 1..40)) {
        let rt = runtime();
        let (backend, spy) = ScriptedBackend::new(script.clone());
        let client = GraphClient::with_backend(backend);

        let first_failure = script
            .iter()
            .position(|step| matches!(step, Step::OpenFails | Step::RunFails | Step::CommitFails));

        rt.block_on(async {
            let mut seen_degraded = false;
            for _ in 0..script.len() {
                let records = client.execute(TEAM_QUERY, &Params::new()).await;
                prop_assert!(records.is_ok());
                if seen_degraded {
                    prop_assert!(client.is_degraded());
                }
                seen_degraded = client.is_degraded();
            }
            Ok(())
        })?;

        match first_failure {
            Some(index) => {
                prop_assert!(client.is_degraded());
                // Nothing after the failing interaction reaches the backend.
                let live_opens = if script[index] == Step::OpenFails { index } else { index + 1 };
                prop_assert_eq!(spy.opened.load(Ordering::SeqCst), live_opens);
            }
            None => {
                prop_assert!(!client.is_degraded());
                prop_assert_eq!(spy.opened.load(Ordering::SeqCst), script.len());
            }
        }
        prop_assert_eq!(spy.opened.load(Ordering::SeqCst), spy.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn unavailable_backend_never_rejects(query in "[A-Za-z0-9 ()\\-:>\\[\\]]{1,64}") {
        prop_assume!(!query.trim().is_empty());
        let rt = runtime();
        let (backend, _) = ScriptedBackend::new(vec![Step::OpenFails]);
        let client = GraphClient::with_backend(backend);
        let records = rt.block_on(client.execute(&query, &Params::new()));
        prop_assert_eq!(records.ok(), Some(MockGenerator::default().generate(&query)));
    }
}

#[tokio::test]
async fn run_failure_on_first_call_switches_to_mock() {
    let (backend, spy) = ScriptedBackend::new(vec![Step::RunFails]);
    let client = GraphClient::with_backend(backend);

    assert!(!client.is_degraded());
    let records = client.execute(PATH_QUERY, &Params::new()).await.unwrap();
    assert!(client.is_degraded());
    assert_eq!(records, MockGenerator::default().generate(PATH_QUERY));

    let first = records.first().unwrap();
    assert_eq!(first.get("pathLength"), Some(&Value::Int(1)));
    assert_eq!(spy.ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_is_released_once_on_every_path() {
    for (step, expected_closes) in [
        (Step::Ok, 1),
        (Step::RunFails, 1),
        (Step::CommitFails, 1),
        (Step::CloseFails, 1),
        (Step::OpenFails, 0),
    ] {
        let (backend, spy) = ScriptedBackend::new(vec![step]);
        let client = GraphClient::with_backend(backend);
        client.execute("RETURN 1", &Params::new()).await.unwrap();
        assert_eq!(
            spy.closed.load(Ordering::SeqCst),
            expected_closes,
            "close count for {step:?}"
        );
        assert_eq!(
            spy.opened.load(Ordering::SeqCst),
            spy.closed.load(Ordering::SeqCst)
        );
    }
}

#[tokio::test]
async fn close_failure_keeps_live_records() {
    let (backend, _) = ScriptedBackend::new(vec![Step::CloseFails]);
    let client = GraphClient::with_backend(backend);
    let records = client.execute("RETURN 1", &Params::new()).await.unwrap();
    assert_eq!(
        records.first().and_then(|r| r.get("origin")),
        Some(&Value::from("backend"))
    );
    assert_eq!(client.mode(), ConnectionMode::Healthy);
}

#[tokio::test]
async fn concurrent_failures_latch_once() {
    const CALLERS: usize = 8;
    let (backend, spy) = ScriptedBackend::concurrent(vec![Step::RunFails; CALLERS], CALLERS);
    let client = Arc::new(GraphClient::with_backend(backend));

    let mut tasks = Vec::new();
    for _ in 0..CALLERS {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client.execute(TEAM_QUERY, &Params::new()).await
        }));
    }
    for task in tasks {
        let records = task.await.unwrap().unwrap();
        assert_eq!(records, MockGenerator::default().generate(TEAM_QUERY));
    }

    // All callers saw a healthy client and failed on the live backend.
    assert_eq!(spy.opened.load(Ordering::SeqCst), CALLERS);
    assert_eq!(spy.ran.load(Ordering::SeqCst), CALLERS);
    assert_eq!(spy.closed.load(Ordering::SeqCst), CALLERS);
    assert!(client.is_degraded());
    assert_eq!(client.state().transitions(), 1);
}

#[tokio::test]
async fn commit_failure_degrades_and_serves_mock() {
    let (backend, spy) = ScriptedBackend::new(vec![Step::CommitFails]);
    let client = GraphClient::with_backend(backend);

    let records = client.execute(TEAM_QUERY, &Params::new()).await.unwrap();
    assert!(client.is_degraded());
    assert_eq!(records, MockGenerator::default().generate(TEAM_QUERY));
    assert_eq!(spy.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn read_sessions_follow_the_same_fallback() {
    let (backend, _) = ScriptedBackend::new(vec![Step::OpenFails]);
    let client = GraphClient::with_backend(backend);
    let records = client
        .execute_with_mode(TEAM_QUERY, &Params::new(), AccessMode::Read)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(client.is_degraded());
}
