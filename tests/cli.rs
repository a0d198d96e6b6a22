mod common;

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use shmpipe::{Channel, CAPACITY};

use common::{payload, TestKeys};

const PRODUCER: &str = env!("CARGO_BIN_EXE_shmpipe-producer");
const CONSUMER: &str = env!("CARGO_BIN_EXE_shmpipe-consumer");

/// Blocks until the producer has created its channel, so the consumer does
/// not race it to the keys.
fn wait_for_channel(t: &TestKeys, producer: &mut Child) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if Channel::open(t.keys).is_ok() {
            return;
        }
        if let Some(status) = producer.try_wait().unwrap() {
            panic!("producer exited early with {status}");
        }
        assert!(Instant::now() < deadline, "producer never created the channel");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn stream_crosses_two_processes() {
    let t = TestKeys::new();
    let input = payload(5 * CAPACITY + 123);

    let mut producer = Command::new(PRODUCER)
        .arg("--key-path")
        .arg(t.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // The producer only drains stdin as the consumer keeps up, so feed it
    // from another thread.
    let mut stdin = producer.stdin.take().unwrap();
    let data = input.clone();
    let feeder = thread::spawn(move || stdin.write_all(&data));

    wait_for_channel(&t, &mut producer);

    let consumer = Command::new(CONSUMER)
        .arg("--key-path")
        .arg(t.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let received = consumer.wait_with_output().unwrap();
    feeder.join().unwrap().unwrap();
    let sent = producer.wait_with_output().unwrap();

    let sent_log = String::from_utf8_lossy(&sent.stderr);
    let received_log = String::from_utf8_lossy(&received.stderr);

    assert_eq!(sent.status.code(), Some(0), "{sent_log}");
    assert_eq!(received.status.code(), Some(0), "{received_log}");
    assert!(received.stdout == input, "output differs from input");

    // Pipe reads may come back short, so only the byte total is fixed; the
    // chunk count must agree between the two sides.
    let summary = |log: &str, verb: &str| {
        let line = log.lines().find(|l| l.contains(verb)).unwrap_or_default();
        line[line.find(verb).map_or(0, |i| i + verb.len())..].to_string()
    };
    let sent_summary = summary(&sent_log, "sent ");
    let received_summary = summary(&received_log, "received ");
    assert!(
        sent_summary.starts_with(&format!("{} bytes in ", input.len())),
        "{sent_log}"
    );
    assert_eq!(sent_summary, received_summary);
    // Captured stderr is not a terminal.
    assert!(!sent_log.contains('\x1b'), "{sent_log:?}");

    let err = Channel::open(t.keys).unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn consumer_without_producer_fails() {
    let t = TestKeys::new();
    let out = Command::new(CONSUMER)
        .arg("--key-path")
        .arg(t.path())
        .stdin(Stdio::null())
        .output()
        .unwrap();

    let log = String::from_utf8_lossy(&out.stderr);
    assert_eq!(out.status.code(), Some(1), "{log}");
    assert!(log.contains("semget: "), "{log}");
    assert_eq!(log.lines().count(), 1, "{log}");
    assert!(out.stdout.is_empty());
}

#[test]
fn missing_key_path_fails() {
    let t = TestKeys::new();
    let absent = t.path().with_extension("absent");
    let out = Command::new(PRODUCER)
        .arg("--key-path")
        .arg(&absent)
        .stdin(Stdio::null())
        .output()
        .unwrap();

    let log = String::from_utf8_lossy(&out.stderr);
    assert_eq!(out.status.code(), Some(1), "{log}");
    assert!(log.contains("ftok: "), "{log}");
}
