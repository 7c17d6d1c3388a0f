//! Property tests for supervisor lifecycle guarantees
//!
//! **Feature: tether-supervisor, Property 1: At most one live process**
//! **Feature: tether-supervisor, Property 2: Duplicate start is idempotent**
//! **Feature: tether-supervisor, Property 3: Running and Error are exclusive per spawn**
//! **Feature: tether-supervisor, Property 4: Startup timeout fires on time**
//! **Feature: tether-supervisor, Property 5: Stop from running releases everything**
//!
//! Every case gets its own runtime so processes and tasks never leak between
//! cases.

#![cfg(unix)]

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{expect_no_state, fake_backend, listening_backend, next_state};
use proptest::prelude::*;
use tether_supervisor::{ServiceFailure, ServiceState, ServiceStatus, Supervisor};
use tokio::sync::broadcast;

const URLS: [&str; 3] = [
    "http://localhost:5000",
    "http://localhost:5010",
    "http://localhost:5020",
];

#[derive(Debug, Clone)]
enum Op {
    Start(usize),
    Stop,
    Pause(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..URLS.len()).prop_map(Op::Start),
        2 => Just(Op::Stop),
        2 => (0u64..40).prop_map(Op::Pause),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Every state published within `window`
async fn states_within(
    rx: &mut broadcast::Receiver<ServiceState>,
    window: Duration,
) -> Vec<ServiceState> {
    let deadline = tokio::time::Instant::now() + window;
    let mut seen = Vec::new();
    while let Ok(Ok(state)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        seen.push(state);
    }
    seen
}

fn statuses(states: &[ServiceState]) -> Vec<ServiceStatus> {
    states.iter().map(ServiceState::status).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// **Validates: at most one live process at any observed instant**
    #[test]
    fn prop_at_most_one_live_process(ops in prop::collection::vec(op_strategy(), 1..10)) {
        runtime().block_on(async {
            let supervisor = Supervisor::new();
            let peak = Arc::new(AtomicUsize::new(0));
            let done = Arc::new(AtomicBool::new(false));

            let sampler = {
                let supervisor = supervisor.clone();
                let peak = peak.clone();
                let done = done.clone();
                tokio::spawn(async move {
                    while !done.load(Ordering::SeqCst) {
                        peak.fetch_max(supervisor.live_processes(), Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                })
            };

            for op in ops {
                match op {
                    Op::Start(index) => {
                        supervisor.start(URLS[index], listening_backend()).unwrap();
                    }
                    Op::Stop => supervisor.stop().await.unwrap(),
                    Op::Pause(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
                }
                prop_assert!(supervisor.live_processes() <= 1);
            }

            supervisor.stop().await.unwrap();
            done.store(true, Ordering::SeqCst);
            sampler.await.unwrap();

            prop_assert!(peak.load(Ordering::SeqCst) <= 1);
            prop_assert_eq!(supervisor.live_processes(), 0);
            prop_assert_eq!(supervisor.state(), ServiceState::Stopped);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Validates: starting the driven target again spawns nothing**
    #[test]
    fn prop_duplicate_start_spawns_once(
        index in 0..URLS.len(),
        repeats in 1usize..4,
        wait_for_running in any::<bool>(),
    ) {
        runtime().block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("spawns.log");
            let mut config = fake_backend(
                "echo spawned >> \"$SPAWN_LOG\"; echo \"Now listening on: $2\"; exec sleep 30",
            );
            config.program = config.program.env("SPAWN_LOG", log.to_string_lossy());

            let supervisor = Supervisor::new();
            let mut states = supervisor.subscribe();

            supervisor.start(URLS[index], config.clone()).unwrap();
            if wait_for_running {
                prop_assert_eq!(next_state(&mut states).await, ServiceState::Started);
                prop_assert_eq!(next_state(&mut states).await.status(), ServiceStatus::Running);
            }
            for _ in 0..repeats {
                supervisor.start(URLS[index], config.clone()).unwrap();
            }
            if !wait_for_running {
                prop_assert_eq!(next_state(&mut states).await, ServiceState::Started);
                prop_assert_eq!(next_state(&mut states).await.status(), ServiceStatus::Running);
            }

            expect_no_state(&mut states, Duration::from_millis(150)).await;
            prop_assert_eq!(supervisor.live_processes(), 1);

            let spawned = std::fs::read_to_string(&log).unwrap();
            prop_assert_eq!(spawned.lines().count(), 1);

            supervisor.stop().await.unwrap();
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Validates: readiness racing process exit never yields both Running and Error**
    #[test]
    fn prop_readiness_and_exit_are_exclusive(code in 0i32..4) {
        runtime().block_on(async {
            let supervisor = Supervisor::new();
            let mut states = supervisor.subscribe();
            let script = format!("echo \"Now listening on: $2\"; exit {}", code);

            supervisor.start(URLS[0], fake_backend(&script)).unwrap();
            let seen = states_within(&mut states, Duration::from_millis(800)).await;

            let exit = tether_process::ExitInfo { code: Some(code), signal: None };
            let via_running = vec![
                ServiceState::Started,
                ServiceState::Running {
                    startup_line: Some(format!("Now listening on: {}", URLS[0])),
                },
                ServiceState::Exited { exit },
            ];
            let via_error = vec![
                ServiceState::Started,
                ServiceState::Error {
                    failure: ServiceFailure::UnexpectedExit { exit },
                },
            ];
            prop_assert!(
                seen == via_running || seen == via_error,
                "unexpected sequence {:?}",
                seen
            );
            prop_assert_eq!(supervisor.live_processes(), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Validates: readiness racing the startup timer never yields both Running and Error**
    #[test]
    fn prop_readiness_and_timeout_are_exclusive(timeout_ms in 50u64..150, skew in -30i64..30) {
        runtime().block_on(async {
            let supervisor = Supervisor::new();
            let mut states = supervisor.subscribe();
            let ready_after = (timeout_ms as i64 + skew).max(0) as f64 / 1000.0;
            let script = format!(
                "sleep {:.3}; echo \"Now listening on: $2\"; exec sleep 30",
                ready_after
            );
            let config = fake_backend(&script).timeout(Duration::from_millis(timeout_ms));

            supervisor.start(URLS[1], config).unwrap();
            let seen = statuses(
                &states_within(&mut states, Duration::from_millis(timeout_ms + 600)).await,
            );

            prop_assert_eq!(seen.first(), Some(&ServiceStatus::Started));
            let running = seen.contains(&ServiceStatus::Running);
            let failed = seen.contains(&ServiceStatus::Error);
            prop_assert!(running != failed, "unexpected sequence {:?}", seen);
            prop_assert_eq!(seen.len(), 2);

            supervisor.stop().await.unwrap();
            prop_assert_eq!(supervisor.live_processes(), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Validates: the startup timeout fires after the configured delay and kills the process**
    #[test]
    fn prop_startup_timeout_fires_on_time(timeout_ms in 100u64..400) {
        runtime().block_on(async {
            let supervisor = Supervisor::new();
            let mut states = supervisor.subscribe();
            let config = fake_backend("exec sleep 30").timeout(Duration::from_millis(timeout_ms));

            let begin = Instant::now();
            supervisor.start(URLS[2], config).unwrap();
            prop_assert_eq!(next_state(&mut states).await, ServiceState::Started);

            let failed = next_state(&mut states).await;
            let elapsed = begin.elapsed();
            prop_assert_eq!(
                failed,
                ServiceState::Error { failure: ServiceFailure::Timeout { timeout_ms } }
            );
            prop_assert!(elapsed >= Duration::from_millis(timeout_ms));
            prop_assert!(elapsed < Duration::from_millis(timeout_ms + 1000));
            prop_assert_eq!(supervisor.live_processes(), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// **Validates: stop from Running ends in Stopped with nothing left alive**
    #[test]
    fn prop_stop_from_running_releases_process(index in 0..URLS.len()) {
        runtime().block_on(async {
            let supervisor = Supervisor::new();
            let mut states = supervisor.subscribe();

            supervisor.start(URLS[index], listening_backend()).unwrap();
            prop_assert_eq!(next_state(&mut states).await, ServiceState::Started);
            prop_assert_eq!(next_state(&mut states).await.status(), ServiceStatus::Running);

            supervisor.stop().await.unwrap();
            prop_assert_eq!(supervisor.live_processes(), 0);
            prop_assert_eq!(next_state(&mut states).await, ServiceState::Stopped);
            expect_no_state(&mut states, Duration::from_millis(100)).await;
            prop_assert_eq!(supervisor.state(), ServiceState::Stopped);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
