//! Property tests for [`PendingState`]'s bookkeeping invariants, checked
//! after an arbitrary sequence of `append`/`mark_flush_checkpoint`/
//! `did_write`/`fail_all` calls with randomized (and sometimes partial)
//! write schedules.

use bytes::Bytes;
use proptest::prelude::*;
use write_engine::{DrainResult, PendingState, WriteItem};

#[derive(Debug, Clone)]
enum Op {
    Append { len: usize },
    MarkFlushCheckpoint,
    DidWrite { item_count: usize, fraction: f32, would_block: bool },
    FailAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..=16).prop_map(|len| Op::Append { len }),
        Just(Op::MarkFlushCheckpoint),
        (1usize..=8, 0.0f32..=1.0f32, any::<bool>())
            .prop_map(|(item_count, fraction, would_block)| Op::DidWrite {
                item_count,
                fraction,
                would_block,
            }),
        Just(Op::FailAll),
    ]
}

fn sum_remaining(state: &PendingState, count: usize) -> usize {
    (0..count)
        .map(|i| state.get(i).map_or(0, WriteItem::remaining))
        .sum()
}

fn total_remaining(state: &PendingState) -> usize {
    sum_remaining(state, state.chunks())
}

fn check_invariants(state: &PendingState) {
    assert_eq!(
        state.bytes(),
        total_remaining(state),
        "aggregate byte count must equal the sum of every queued item's remaining bytes"
    );
    assert!(
        state.flushed_count() <= state.chunks(),
        "the flush mark can never claim more items than are queued"
    );
    if state.chunks() == 0 {
        assert_eq!(state.flushed_count(), 0, "an empty queue has no flush mark");
        assert!(!state.has_flushed_items());
    }
    if state.chunks() > 0 {
        let head = state.get(0).expect("chunks() > 0 guarantees a head item");
        assert!(
            head.remaining() > 0,
            "the head of the queue must never sit at zero remaining bytes"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold_after_arbitrary_op_sequences(ops in proptest::collection::vec(op_strategy(), 0..64)) {
        let mut state = PendingState::new();

        for op in ops {
            match op {
                Op::Append { len } => {
                    let payload = vec![b'x'; len];
                    state.append(WriteItem::Buffer(Bytes::from(payload)), None);
                }
                Op::MarkFlushCheckpoint => {
                    let _ = state.mark_flush_checkpoint(None);
                }
                Op::DidWrite { item_count, fraction, would_block } => {
                    if !state.has_flushed_items() {
                        continue;
                    }
                    let item_count = item_count.min(state.flushed_count()).max(1);
                    let available = sum_remaining(&state, item_count);
                    if available == 0 {
                        continue;
                    }
                    let result = if would_block {
                        DrainResult::WouldBlock(0)
                    } else {
                        let produced = ((available as f32) * fraction).round() as usize;
                        DrainResult::Processed(produced.min(available))
                    };
                    let (fired, _outcome) = state.did_write(item_count, result);
                    fired.succeed_all();
                }
                Op::FailAll => {
                    let fired = state.fail_all();
                    let reason = std::sync::Arc::new(std::io::Error::other("proptest fail_all"));
                    fired.fail_all(&reason);
                }
            }

            check_invariants(&state);
        }
    }

    #[test]
    fn prop_fail_all_always_empties_the_queue(ops in proptest::collection::vec(op_strategy(), 0..32)) {
        let mut state = PendingState::new();
        for op in ops {
            match op {
                Op::Append { len } => {
                    state.append(WriteItem::Buffer(Bytes::from(vec![b'x'; len])), None);
                }
                Op::MarkFlushCheckpoint => {
                    let _ = state.mark_flush_checkpoint(None);
                }
                Op::DidWrite { .. } | Op::FailAll => {}
            }
        }

        let fired = state.fail_all();
        let reason = std::sync::Arc::new(std::io::Error::other("proptest fail_all"));
        fired.fail_all(&reason);

        prop_assert!(state.is_empty());
        prop_assert_eq!(state.bytes(), 0);
        prop_assert_eq!(state.chunks(), 0);
        prop_assert!(!state.has_flushed_items());
    }
}
