use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use plotkit_communication::{
    ControllerResponse, DeviceSession, HaltReason, PollOutcome, SessionConfig, SessionState,
};
use plotkit_core::{ControllerError, Job, JobQueue, JobSource, JobSourceError};

use crate::mock::{fast_config, short, ScriptedTransport};

fn started(transport: ScriptedTransport) -> DeviceSession<ScriptedTransport> {
    let mut session = DeviceSession::new(transport, fast_config());
    session.start().unwrap();
    session
}

#[test]
fn test_boot_sequence() {
    let transport = ScriptedTransport::always_ok();
    let log = transport.sent_data.clone();
    let session = started(transport);

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(
        *log.lock(),
        vec!["\r\n\r\n", "M5\n", "$X\n", "$H\n", "G90\n", "G21\n", "G92 X0 Y0\n"]
    );
}

#[test]
fn test_boot_discards_banner() {
    let mut transport = ScriptedTransport::always_ok();
    transport.push_unsolicited("\r\nGrbl 1.1h ['$' for help]\r\n");
    transport.push_unsolicited("[MSG:'$H'|'$X' to unlock]\r\n");
    let session = started(transport);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_locked_controller_rejects_boot_pen_up() {
    let unlocked = Arc::new(AtomicUsize::new(0));
    let seen = unlocked.clone();
    let transport = ScriptedTransport::new(move |line| {
        if line == "$X" {
            seen.fetch_add(1, Ordering::SeqCst);
        }
        if seen.load(Ordering::SeqCst) == 0 {
            vec!["error:9\r\n"]
        } else {
            vec!["ok\r\n"]
        }
    });
    let session = started(transport);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(unlocked.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unlock_retries_then_halts() {
    let transport = ScriptedTransport::new(|line| match line {
        "$X" => vec!["ALARM:1\r\n"],
        _ => vec!["ok\r\n"],
    });
    let log = transport.sent_data.clone();
    let mut session = DeviceSession::new(transport, fast_config());

    let halt = session.start().unwrap_err();
    assert_eq!(halt.state, SessionState::Unlocking);
    match halt.reason {
        HaltReason::UnlockFailed { attempts, last } => {
            assert_eq!(attempts, 5);
            assert!(matches!(last, ControllerError::Alarm { code: Some(1), .. }));
        }
        other => panic!("unexpected halt reason: {other:?}"),
    }

    let log = log.lock();
    assert_eq!(log.iter().filter(|l| *l == "$X\n").count(), 5);
    assert!(!log.contains(&"$H\n".to_string()));
    assert_eq!(session.state(), SessionState::Halted);
}

#[test]
fn test_unlock_succeeds_on_retry() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let transport = ScriptedTransport::new(move |line| {
        if line == "$X" && counter.fetch_add(1, Ordering::SeqCst) < 2 {
            return vec![];
        }
        vec!["ok\r\n"]
    });
    let session = started(transport);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_homing_failure_halts() {
    let transport = ScriptedTransport::new(|line| match line {
        "$H" => vec!["ALARM:9\r\n"],
        _ => vec!["ok\r\n"],
    });
    let mut session = DeviceSession::new(transport, fast_config());
    let halt = session.start().unwrap_err();
    assert_eq!(halt.state, SessionState::Homing);
    assert!(matches!(halt.reason, HaltReason::HomingFailed(_)));
}

#[test]
fn test_zero_failures_are_best_effort() {
    let transport = ScriptedTransport::new(|line| match line {
        "G92 X0 Y0" => vec!["error:20\r\n"],
        _ => vec!["ok\r\n"],
    });
    let session = started(transport);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_send_line_wait_reassembles_split_acknowledgment() {
    let transport = ScriptedTransport::new(|_| vec!["o", "k\r\n"]);
    let mut session = DeviceSession::new(transport, fast_config());
    assert_eq!(
        session.send_line_wait("G21", short()),
        Ok(ControllerResponse::Acknowledged)
    );
}

#[test]
fn test_send_line_wait_program_end() {
    let transport = ScriptedTransport::new(|_| vec!["[MSG:Pgm End]\r\n"]);
    let mut session = DeviceSession::new(transport, fast_config());
    assert_eq!(
        session.send_line_wait("M30", short()),
        Ok(ControllerResponse::ProgramEnd)
    );
}

#[test]
fn test_send_line_wait_blank_line_is_not_sent() {
    let transport = ScriptedTransport::always_ok();
    let log = transport.sent_data.clone();
    let mut session = DeviceSession::new(transport, fast_config());
    assert_eq!(
        session.send_line_wait("   ", short()),
        Ok(ControllerResponse::Acknowledged)
    );
    assert!(log.lock().is_empty());
}

#[test]
fn test_send_line_wait_times_out() {
    let transport = ScriptedTransport::new(|_| vec!["[MSG:nothing useful]\r\n"]);
    let mut session = DeviceSession::new(transport, fast_config());
    assert_eq!(
        session.send_line_wait("G1 X1 Y1", short()),
        Err(ControllerError::Timeout { timeout_ms: 50 })
    );
}

#[test]
fn test_send_line_wait_decodes_error_code() {
    let transport = ScriptedTransport::new(|_| vec!["error:22\r\n"]);
    let mut session = DeviceSession::new(transport, fast_config());
    match session.send_line_wait("G1 X1", short()) {
        Err(ControllerError::CommandRejected { code, message }) => {
            assert_eq!(code, Some(22));
            assert_eq!(message, "Feed rate not set");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_send_line_wait_waits_for_split_error_code() {
    let transport = ScriptedTransport::new(|_| vec!["error:2", "2\r\n"]);
    let mut session = DeviceSession::new(transport, fast_config());
    match session.send_line_wait("G1 X1", short()) {
        Err(ControllerError::CommandRejected { code, message }) => {
            assert_eq!(code, Some(22));
            assert_eq!(message, "Feed rate not set");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_unterminated_alarm_still_fails() {
    let transport = ScriptedTransport::new(|_| vec!["ALARM:1"]);
    let mut session = DeviceSession::new(transport, fast_config());
    assert!(matches!(
        session.send_line_wait("G1 X1", short()),
        Err(ControllerError::Alarm { code: Some(1), .. })
    ));
}

#[test]
fn test_split_alarm_code_reaches_halt_reason() {
    let transport = ScriptedTransport::new(|line| match line {
        "G1 X2 Y2" => vec!["ALARM:", "1", "0\r\n"],
        _ => vec!["ok\r\n"],
    });
    let mut session = started(transport);
    let halt = session.run_job(&Job::new("G1 X1 Y1\nG1 X2 Y2")).unwrap_err();
    match halt.reason {
        HaltReason::MotionFailed { failure, .. } => assert_eq!(
            failure,
            ControllerError::Alarm {
                code: Some(10),
                message: "Homing failed: dual axis switch not found".to_string(),
            }
        ),
        other => panic!("unexpected halt reason: {other:?}"),
    }
}

#[test]
fn test_job_lines_and_recovery() {
    let transport = ScriptedTransport::always_ok();
    let log = transport.sent_data.clone();
    let mut session = started(transport);
    log.lock().clear();

    let job = Job::new("G21\nG90\n; comment\nF2500\n\nG1 X1.000 Y2.000 (draw)\nM30");
    let report = session.run_job(&job).unwrap();

    assert_eq!(report.lines_sent, 5);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(
        *log.lock(),
        vec![
            "G21\n",
            "G90\n",
            "F2500\n",
            "G1 X1.000 Y2.000\n",
            "M30\n",
            "M5\n",
            "G90\n",
            "G21\n",
            "G0 X0 Y0\n",
            "G92 X0 Y0\n",
        ]
    );
}

#[test]
fn test_alarm_mid_job_halts_and_sends_nothing_more() {
    let transport = ScriptedTransport::new(|line| match line {
        "G1 X2.000 Y2.000" => vec!["ALARM:2\r\n"],
        _ => vec!["ok\r\n"],
    });
    let log = transport.sent_data.clone();
    let mut session = started(transport);
    log.lock().clear();

    let job = Job::new("G1 X1.000 Y1.000\nG1 X2.000 Y2.000\nG1 X3.000 Y3.000\nM30");
    let halt = session.run_job(&job).unwrap_err();

    assert_eq!(halt.state, SessionState::Running);
    match &halt.reason {
        HaltReason::MotionFailed {
            line_number,
            line,
            failure,
        } => {
            assert_eq!(*line_number, 2);
            assert_eq!(line, "G1 X2.000 Y2.000");
            assert!(failure.is_controller_fault());
        }
        other => panic!("unexpected halt reason: {other:?}"),
    }
    assert_eq!(*log.lock(), vec!["G1 X1.000 Y1.000\n", "G1 X2.000 Y2.000\n"]);

    // Halted for good: nothing else reaches the transport.
    assert_eq!(session.run_job(&job), Err(halt.clone()));
    assert_eq!(
        session.send_line_wait("M5", short()),
        Err(ControllerError::Halted)
    );
    assert_eq!(session.start(), Err(halt));
    assert_eq!(log.lock().len(), 2);
    assert_eq!(session.state(), SessionState::Halted);
}

#[test]
fn test_timeout_mid_job_halts() {
    let transport = ScriptedTransport::new(|line| match line {
        "G1 X1 Y1" => vec![],
        _ => vec!["ok\r\n"],
    });
    let mut session = started(transport);
    let halt = session.run_job(&Job::new("G1 X1 Y1\nG1 X2 Y2")).unwrap_err();
    assert!(matches!(
        halt.reason,
        HaltReason::MotionFailed {
            failure: ControllerError::Timeout { .. },
            ..
        }
    ));
}

#[test]
fn test_failed_return_to_origin_halts() {
    let transport = ScriptedTransport::new(|line| match line {
        "G0 X0 Y0" => vec!["ALARM:2\r\n"],
        _ => vec!["ok\r\n"],
    });
    let mut session = started(transport);
    let halt = session.run_job(&Job::new("G1 X1 Y1")).unwrap_err();
    assert_eq!(halt.state, SessionState::Recovering);
    assert!(matches!(halt.reason, HaltReason::ReturnToOriginFailed(_)));
}

#[test]
fn test_failed_pen_up_after_job_halts() {
    let job_done = Arc::new(AtomicBool::new(false));
    let seen = job_done.clone();
    let transport = ScriptedTransport::new(move |line| {
        if line == "G1 X1 Y1" {
            seen.store(true, Ordering::SeqCst);
        }
        if line == "M5" && seen.load(Ordering::SeqCst) {
            return vec!["ALARM:3\r\n"];
        }
        vec!["ok\r\n"]
    });
    let log = transport.sent_data.clone();
    let mut session = started(transport);
    log.lock().clear();

    let halt = session.run_job(&Job::new("G1 X1 Y1")).unwrap_err();
    assert_eq!(halt.state, SessionState::Recovering);
    assert!(matches!(
        halt.reason,
        HaltReason::PenUpFailed(ControllerError::Alarm { code: Some(3), .. })
    ));
    assert_eq!(*log.lock(), vec!["G1 X1 Y1\n", "M5\n"]);
    assert!(!log.lock().contains(&"G0 X0 Y0\n".to_string()));
}

struct FailingSource;

impl JobSource for FailingSource {
    fn next_job(&mut self) -> Result<Option<Job>, JobSourceError> {
        Err(JobSourceError::Unreachable {
            reason: "connection refused".to_string(),
        })
    }
}

#[test]
fn test_poll_once() {
    let mut session = started(ScriptedTransport::always_ok());
    let mut queue = Arc::new(JobQueue::new(4));

    assert_eq!(session.poll_once(&mut queue).unwrap(), PollOutcome::NoJob);

    queue.submit("G1 X1 Y1\nG1 X2 Y2").unwrap();
    match session.poll_once(&mut queue).unwrap() {
        PollOutcome::Completed(report) => assert_eq!(report.lines_sent, 2),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(queue.is_empty());
}

#[test]
fn test_fetch_failures_are_not_fatal() {
    let mut session = started(ScriptedTransport::always_ok());
    assert!(matches!(
        session.poll_once(&mut FailingSource),
        Ok(PollOutcome::FetchFailed(_))
    ));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_run_boots_and_drains_queue() {
    let transport = ScriptedTransport::always_ok();
    let log = transport.sent_data.clone();
    let mut session = DeviceSession::new(transport, fast_config());
    let mut queue = Arc::new(JobQueue::new(4));
    queue.submit("G1 X5 Y5").unwrap();
    queue.submit("G1 X6 Y6").unwrap();

    let mut ticks = 0;
    session
        .run(&mut queue, || {
            ticks += 1;
            ticks <= 3
        })
        .unwrap();

    assert!(queue.is_empty());
    let log = log.lock();
    assert!(log.contains(&"$H\n".to_string()));
    assert!(log.contains(&"G1 X5 Y5\n".to_string()));
    assert!(log.contains(&"G1 X6 Y6\n".to_string()));
}

#[test]
fn test_run_returns_halt() {
    let transport = ScriptedTransport::new(|line| match line {
        "G1 X9 Y9" => vec!["error:33\r\n"],
        _ => vec!["ok\r\n"],
    });
    let mut session = DeviceSession::new(transport, fast_config());
    let mut queue = Arc::new(JobQueue::new(4));
    queue.submit("G1 X9 Y9").unwrap();

    let halt = session.run(&mut queue, || true).unwrap_err();
    assert!(matches!(halt.reason, HaltReason::MotionFailed { line_number: 1, .. }));
}

#[test]
fn test_run_waits_poll_interval_after_a_job() {
    let config = SessionConfig {
        poll_interval_ms: 30,
        ..fast_config()
    };
    let mut session = DeviceSession::new(ScriptedTransport::always_ok(), config);
    session.start().unwrap();
    let mut queue = Arc::new(JobQueue::new(4));
    queue.submit("G1 X1 Y1").unwrap();

    let mut ticks = 0;
    let started_at = Instant::now();
    session
        .run(&mut queue, || {
            ticks += 1;
            ticks <= 2
        })
        .unwrap();

    // One tick runs the job, one finds nothing; each waits the interval.
    assert!(queue.is_empty());
    assert!(started_at.elapsed() >= Duration::from_millis(60));
}
