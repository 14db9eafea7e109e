/// Pending-table behaviour seen from the outside
use serde_json::json;
use tokio::sync::oneshot;

use skinguide_mcp::mcp::{Completion, Correlator, CorrelatorError};

#[tokio::test]
async fn test_each_id_settles_its_own_waiter() {
    let correlator = Correlator::new();
    let mut receivers = Vec::new();
    for id in 1..=5 {
        let (tx, rx) = oneshot::channel();
        correlator.register(id, tx).unwrap();
        receivers.push((id, rx));
    }

    for id in [4, 2, 5, 1, 3] {
        assert!(correlator.resolve(id, Completion::Result(json!(id))));
    }
    for (id, rx) in receivers {
        assert_eq!(rx.await.unwrap(), Completion::Result(json!(id)));
    }
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_drain_settles_each_entry_once() {
    let correlator = Correlator::new();
    let (tx1, rx1) = oneshot::channel();
    let (tx2, rx2) = oneshot::channel();
    correlator.register(1, tx1).unwrap();
    correlator.register(2, tx2).unwrap();

    assert!(correlator.resolve(1, Completion::Result(json!("done"))));
    assert_eq!(correlator.drain_all(), 1);
    assert_eq!(correlator.drain_all(), 0);

    assert_eq!(rx1.await.unwrap(), Completion::Result(json!("done")));
    assert_eq!(rx2.await.unwrap(), Completion::Closed);
    assert!(correlator.is_closed());

    let (tx3, _rx3) = oneshot::channel();
    assert_eq!(correlator.register(3, tx3), Err(CorrelatorError::Closed(3)));
}

#[test]
fn test_resolving_after_waiter_left_is_harmless() {
    let correlator = Correlator::new();
    let (tx, rx) = oneshot::channel();
    correlator.register(9, tx).unwrap();
    drop(rx);

    assert!(correlator.resolve(9, Completion::Result(json!(null))));
    assert!(!correlator.is_pending(9));
}
