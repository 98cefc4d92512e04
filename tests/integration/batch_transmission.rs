//! Batch machine behavior against the mock link transport.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use petlink::link::mock::MockLink;
use petlink::model::CommandInfo;
use petlink::sender::{BatchOutcome, PacketSender};

use crate::common::init_test_logging;

const SRC: &str = "aa:bb:cc:dd:ee:ff";
const DST: &str = "11:22:33:44:55:66";

fn reset_command(reps: u32, delay_ms: u64) -> CommandInfo {
    CommandInfo::resolve("X_FF_Reset", "X_FF_Reset")
        .unwrap()
        .with_repetitions(reps)
        .with_delay_ms(delay_ms)
}

type ProgressLog = Arc<Mutex<Vec<(u32, u32, String)>>>;

fn progress_recorder() -> (ProgressLog, impl Fn(u32, u32, &str) + Send + Sync) {
    let log: ProgressLog = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |cur: u32, total: u32, msg: &str| {
        sink.lock().unwrap().push((cur, total, msg.to_string()));
    })
}

#[test]
fn three_repetitions_produce_three_wire_frames() {
    init_test_logging();
    let link = Arc::new(MockLink::new());
    let sender = PacketSender::new(link.clone());
    let (log, on_progress) = progress_recorder();

    let outcome = sender
        .send_batch(&[reset_command(3, 0)], SRC, DST, "eth0", &on_progress)
        .unwrap();

    assert_eq!(outcome, BatchOutcome::Completed);
    assert_eq!(link.send_count(), 3);
    assert_eq!(link.sent_opcodes(), vec![0xff, 0xff, 0xff]);

    let log = log.lock().unwrap();
    let (cur, total, _) = log.last().unwrap();
    assert_eq!((*cur, *total), (3, 3));
}

#[test]
fn frames_on_the_wire_carry_the_batch_addressing() {
    init_test_logging();
    let link = Arc::new(MockLink::new());
    let sender = PacketSender::new(link.clone());
    let noop = |_: u32, _: u32, _: &str| {};

    sender
        .send_batch(&[reset_command(1, 0)], SRC, DST, "eth3", &noop)
        .unwrap();

    let frames = link.sent_frames();
    assert_eq!(frames[0].interface, "eth3");
    assert_eq!(&frames[0].frame[0..6], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    assert_eq!(&frames[0].frame[6..12], &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
}

#[test]
fn cancellation_latency_is_bounded_by_the_poll_interval() {
    init_test_logging();
    let link = Arc::new(MockLink::new());
    let sender = Arc::new(PacketSender::new(link.clone()));
    let (_log, on_progress) = progress_recorder();

    let handle = Arc::clone(&sender).spawn_batch(
        vec![reset_command(10, 1_000)],
        SRC.to_string(),
        DST.to_string(),
        "eth0".to_string(),
        on_progress,
    );

    while link.send_count() == 0 {
        thread::sleep(Duration::from_millis(5));
    }
    let cancel_at = Instant::now();
    sender.cancel();

    let outcome = handle.join().unwrap().unwrap();
    assert_eq!(outcome, BatchOutcome::Cancelled);
    assert!(
        cancel_at.elapsed() < Duration::from_millis(500),
        "cancel took {:?}",
        cancel_at.elapsed()
    );
    assert_eq!(link.send_count(), 1);
}

#[test]
fn transmitter_is_single_flight() {
    init_test_logging();
    let link = Arc::new(MockLink::new());
    let sender = Arc::new(PacketSender::new(link));
    let (_log, on_progress) = progress_recorder();

    let handle = Arc::clone(&sender).spawn_batch(
        vec![reset_command(2, 5_000)],
        SRC.to_string(),
        DST.to_string(),
        "eth0".to_string(),
        on_progress,
    );

    while !sender.is_sending() {
        thread::sleep(Duration::from_millis(5));
    }

    let noop = |_: u32, _: u32, _: &str| {};
    let second = sender.send_batch(&[reset_command(1, 0)], SRC, DST, "eth0", &noop);
    assert!(second.is_err(), "second concurrent batch must be rejected");

    sender.cancel();
    handle.join().unwrap().unwrap();

    // Idle again: a new batch is accepted.
    let outcome = sender
        .send_batch(&[reset_command(1, 0)], SRC, DST, "eth0", &noop)
        .unwrap();
    assert_eq!(outcome, BatchOutcome::Completed);
}

#[test]
fn individual_failures_do_not_abort_the_batch() {
    init_test_logging();
    let link = Arc::new(MockLink::new());
    link.inject_error("cable pulled");
    let sender = PacketSender::new(link.clone());
    let (log, on_progress) = progress_recorder();

    let outcome = sender
        .send_batch(&[reset_command(4, 0)], SRC, DST, "eth0", &on_progress)
        .unwrap();

    assert_eq!(outcome, BatchOutcome::Completed);
    assert_eq!(link.attempt_count(), 4);
    assert_eq!(link.send_count(), 3);

    let log = log.lock().unwrap();
    assert_eq!(log.iter().filter(|(_, _, m)| m.starts_with("Error:")).count(), 1);
    assert_eq!((log.last().unwrap().0, log.last().unwrap().1), (4, 4));
}

#[test]
fn progress_totals_span_all_items() {
    init_test_logging();
    let link = Arc::new(MockLink::new());
    let sender = PacketSender::new(link.clone());
    let (log, on_progress) = progress_recorder();

    let items = vec![
        reset_command(2, 0),
        CommandInfo::resolve("X_02_TestTrigger", "X_02_TestTrigger")
            .unwrap()
            .with_repetitions(3),
    ];
    sender.send_batch(&items, SRC, DST, "eth0", &on_progress).unwrap();

    assert_eq!(link.sent_opcodes(), vec![0xff, 0xff, 0x02, 0x02, 0x02]);
    let log = log.lock().unwrap();
    assert!(log.iter().all(|(_, total, _)| *total == 5));
}
