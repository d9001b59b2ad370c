use plotkit_communication::{ControllerResponse, ResponseScanner};
use proptest::prelude::*;

#[test]
fn test_acknowledgment_split_across_reads() {
    let mut scanner = ResponseScanner::new();
    scanner.feed(b"o");
    assert_eq!(scanner.classify(), ControllerResponse::Unrecognized);
    scanner.feed(b"k\r\n");
    assert_eq!(scanner.classify(), ControllerResponse::Acknowledged);
}

#[test]
fn test_alarm_code_split_across_reads() {
    let mut scanner = ResponseScanner::new();
    scanner.feed(b"AL");
    scanner.feed(b"ARM:");
    scanner.feed(b"2\r\n");
    assert_eq!(scanner.classify(), ControllerResponse::Alarm(Some(2)));
}

#[test]
fn test_banner_then_acknowledgment() {
    let mut scanner = ResponseScanner::new();
    scanner.feed(b"\r\nGrbl 1.1h ['$' for help]\r\n");
    assert_eq!(scanner.classify(), ControllerResponse::Banner);
    scanner.feed(b"ok\r\n");
    assert_eq!(scanner.classify(), ControllerResponse::Acknowledged);
}

proptest! {
    #[test]
    fn prop_any_split_of_a_response_classifies_the_same(split in 0usize..=9) {
        let response = b"error:22\r\n";
        let split = split.min(response.len());
        let mut scanner = ResponseScanner::new();
        scanner.feed(&response[..split]);
        scanner.feed(&response[split..]);
        prop_assert_eq!(scanner.classify(), ControllerResponse::Error(Some(22)));
    }
}
