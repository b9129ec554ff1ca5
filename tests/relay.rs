use std::time::Duration;

use fill_relay::{
    connection::{ConnectionManager, ConnectionState, DISCONNECTED_TEXT, connected_text},
    notify::{self, NotificationReceiver},
    testing::{
        self, RecordingSleep, Recorded, Script, ScriptedConnector, Session, SessionEnd, fill,
        subscription_ack, user_fills,
    },
    types::SubscribeRequest,
    types::WalletAddress,
};
use tokio_util::sync::CancellationToken;

const A: &str = "0xabc";
const B: &str = "0xdef";

fn live_text(wallet: &str, tid: u64) -> String {
    format!(
        "HL {wallet} -> [{}] fill BTC B sz=0.01 px=64000.0 fee=0.1 USDC taker",
        1_700_000_000_000u64 + tid
    )
}

fn baseline_text(wallet: &str, tid: u64) -> String {
    format!(
        "HL {wallet} baseline -> [{}] fill BTC B sz=0.01 px=64000.0 fee=0.1 USDC taker",
        1_700_000_000_000u64 + tid
    )
}

fn subscribe(wallet: &str) -> String {
    SubscribeRequest::user_fills(&WalletAddress::parse(wallet).unwrap())
        .to_json()
        .unwrap()
}

fn no_fills() -> Vec<serde_json::Value> {
    Vec::new()
}

fn accept(frames: Vec<String>, end: SessionEnd) -> Script {
    Script::Accept(Session::new(frames, end))
}

struct Run {
    connector: ScriptedConnector,
    sleep: RecordingSleep,
    notifications: NotificationReceiver,
    final_state: ConnectionState,
}

/// Drives a manager over `scripts` until the script is exhausted.
async fn run(wallets: &str, scripts: Vec<Script>) -> Run {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new(scripts, shutdown.clone());
    let sleep = RecordingSleep::new();
    let (tx, notifications) = notify::channel(64);

    let mut manager = ConnectionManager::new(
        &testing::config(wallets),
        connector.clone(),
        tx,
        sleep.sleeper(),
    );
    testing::within(Duration::from_secs(5), manager.run(shutdown)).await;

    Run {
        connector,
        sleep,
        notifications,
        final_state: manager.state(),
    }
}

#[tokio::test]
async fn test_first_snapshot_reports_single_baseline() {
    let mut r = run(
        A,
        vec![accept(
            vec![
                subscription_ack(A),
                user_fills(A, true, [fill(1), fill(2)]),
                user_fills(A, false, [fill(2)]),
            ],
            SessionEnd::Shutdown,
        )],
    )
    .await;

    assert_eq!(
        r.notifications.drain(),
        vec![connected_text(1), baseline_text(A, 2)]
    );
}

#[tokio::test]
async fn test_duplicates_within_live_batch() {
    let mut r = run(
        A,
        vec![accept(
            vec![
                user_fills(A, true, no_fills()),
                user_fills(A, false, [fill(3), fill(4), fill(3)]),
            ],
            SessionEnd::Shutdown,
        )],
    )
    .await;

    assert_eq!(
        r.notifications.drain(),
        vec![connected_text(1), live_text(A, 3), live_text(A, 4)]
    );
}

#[tokio::test]
async fn test_reconnect_resubscribes_and_keeps_dedup_state() {
    let mut r = run(
        &format!("{A},{B}"),
        vec![
            accept(
                vec![
                    user_fills(A, true, no_fills()),
                    user_fills(B, true, no_fills()),
                    user_fills(A, false, [fill(1)]),
                ],
                SessionEnd::Drop,
            ),
            accept(
                vec![
                    user_fills(A, true, [fill(1)]),
                    user_fills(B, true, no_fills()),
                    user_fills(A, false, [fill(1), fill(2)]),
                ],
                SessionEnd::Drop,
            ),
            accept(vec![], SessionEnd::Shutdown),
        ],
    )
    .await;

    assert_eq!(
        r.notifications.drain(),
        vec![
            connected_text(2),
            live_text(A, 1),
            DISCONNECTED_TEXT.to_string(),
            live_text(A, 2),
            DISCONNECTED_TEXT.to_string(),
        ]
    );
    assert_eq!(
        r.connector.sent(),
        vec![
            subscribe(A),
            subscribe(B),
            subscribe(A),
            subscribe(B),
            subscribe(A),
            subscribe(B),
        ]
    );
    // Backoff resets on every successful streaming entry.
    assert_eq!(
        r.sleep.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(1)]
    );
}

#[tokio::test]
async fn test_refused_connections_back_off_exponentially() {
    let mut r = run(
        A,
        vec![
            Script::Refuse,
            Script::Refuse,
            Script::Refuse,
            Script::Refuse,
            Script::Refuse,
            accept(vec![], SessionEnd::Drop),
            Script::Refuse,
            accept(vec![], SessionEnd::Shutdown),
        ],
    )
    .await;

    let secs = |s: u64| Duration::from_secs(s);
    assert_eq!(
        r.sleep.delays(),
        vec![secs(1), secs(2), secs(4), secs(8), secs(8), secs(1), secs(2)]
    );
    assert_eq!(r.connector.connects(), 8);
    assert_eq!(
        r.notifications.drain(),
        vec![connected_text(1), DISCONNECTED_TEXT.to_string()]
    );
}

#[tokio::test]
async fn test_repeated_snapshot_is_silent_and_absorbed() {
    let mut r = run(
        A,
        vec![accept(
            vec![
                user_fills(A, true, [fill(1)]),
                user_fills(A, true, (1..=8).map(fill)),
                user_fills(A, false, (4..=9).map(fill)),
            ],
            SessionEnd::Shutdown,
        )],
    )
    .await;

    assert_eq!(
        r.notifications.drain(),
        vec![connected_text(1), baseline_text(A, 1), live_text(A, 9)]
    );
}

#[tokio::test]
async fn test_failed_subscribe_is_retried_silently() {
    let mut r = run(
        A,
        vec![
            Script::Accept(Session::failing_send()),
            accept(vec![], SessionEnd::Shutdown),
        ],
    )
    .await;

    assert_eq!(r.notifications.drain(), vec![connected_text(1)]);
    assert_eq!(r.sleep.delays(), vec![Duration::from_secs(1)]);
    assert_eq!(
        r.connector.log(),
        vec![
            Recorded::Connect,
            Recorded::Close,
            Recorded::Connect,
            Recorded::Sent(subscribe(A)),
            Recorded::Close,
        ]
    );
}

#[tokio::test]
async fn test_shutdown_closes_without_resubscribing() {
    let r = run(
        A,
        vec![accept(vec![subscription_ack(A)], SessionEnd::Shutdown)],
    )
    .await;

    assert_eq!(
        r.connector.log(),
        vec![Recorded::Connect, Recorded::Sent(subscribe(A)), Recorded::Close]
    );
    assert!(r.sleep.delays().is_empty());
    assert_eq!(r.final_state, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_unwatched_and_malformed_frames_are_dropped() {
    let mut r = run(
        A,
        vec![accept(
            vec![
                "garbage".to_string(),
                r#"{"channel":"pong"}"#.to_string(),
                user_fills("0x999", false, [fill(1)]),
                user_fills(A, false, [fill(2)]),
            ],
            SessionEnd::Shutdown,
        )],
    )
    .await;

    assert_eq!(
        r.notifications.drain(),
        vec![connected_text(1), live_text(A, 2)]
    );
}

#[tokio::test]
async fn test_cancel_interrupts_backoff_sleep() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new(
        [Script::Refuse, accept(vec![], SessionEnd::Shutdown)],
        shutdown.clone(),
    );
    let (tx, _rx) = notify::channel(8);
    let mut manager = ConnectionManager::new(
        &testing::config(A),
        connector.clone(),
        tx,
        // real sleep, far longer than the test
        |_| tokio::time::sleep(Duration::from_secs(3600)),
    );

    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    testing::within(Duration::from_secs(5), manager.run(shutdown)).await;
    assert_eq!(connector.connects(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_state_changes_are_published() {
    let shutdown = CancellationToken::new();
    let connector = ScriptedConnector::new(
        [accept(vec![subscription_ack(A)], SessionEnd::Shutdown)],
        shutdown.clone(),
    );
    let (tx, _rx) = notify::channel(8);
    let mut manager = ConnectionManager::new(
        &testing::config(A),
        connector,
        tx,
        RecordingSleep::new().sleeper(),
    );
    let mut state = manager.subscribe_state();
    assert_eq!(*state.borrow_and_update(), ConnectionState::Disconnected);

    testing::within(Duration::from_secs(5), manager.run(shutdown)).await;

    assert!(state.has_changed().unwrap());
    assert_eq!(*state.borrow_and_update(), ConnectionState::Disconnected);
    assert!(!manager.processor().baseline().is_latched(&WalletAddress::parse(A).unwrap()));
}

#[tokio::test]
async fn test_baseline_not_repeated_for_fill_seen_live() {
    let mut r = run(
        A,
        vec![accept(
            vec![
                user_fills(A, false, [fill(2)]),
                user_fills(A, true, [fill(1), fill(2)]),
            ],
            SessionEnd::Shutdown,
        )],
    )
    .await;

    assert_eq!(
        r.notifications.drain(),
        vec![connected_text(1), live_text(A, 2)]
    );
}
