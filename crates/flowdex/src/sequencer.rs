//! Per-key resequencing of event batches.
//!
//! The reducer requires events for one composite key in chain order, but a
//! chain follower hands over blocks of interleaved logs. This adapter
//! groups a batch by composite key and orders each group by
//! `(blockNumber, logIndex)`, which is all the reordering the ingest
//! contract permits, because cross-key order carries no meaning.

use std::collections::BTreeMap;

use flowdex_crypto::composite_key;
use flowdex_types::{CompositeKey, FlowUpdateEvent};

/// Groups a batch by composite key, each group in chain order.
///
/// Groups come back in key order, so batch ingestion is deterministic
/// regardless of how the input was interleaved. Duplicate positions within
/// a group are preserved as-is; the reducer decides whether they are
/// redeliveries or conflicts.
pub(crate) fn resequence(
    events: Vec<FlowUpdateEvent>,
) -> Vec<(CompositeKey, Vec<FlowUpdateEvent>)> {
    let mut groups: BTreeMap<CompositeKey, Vec<FlowUpdateEvent>> = BTreeMap::new();

    for event in events {
        let key = composite_key(event.sender, event.receiver, event.token);
        groups.entry(key).or_default().push(event);
    }

    for group in groups.values_mut() {
        group.sort_by_key(FlowUpdateEvent::position);
    }

    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdex_types::{Address, BlockNumber, FlowRate, LogIndex, Timestamp, TxHash};

    fn event(receiver_byte: u8, block: u64, log: u64) -> FlowUpdateEvent {
        FlowUpdateEvent {
            token: Address::from_bytes([0x01; 20]),
            sender: Address::from_bytes([0xA1; 20]),
            receiver: Address::from_bytes([receiver_byte; 20]),
            flow_rate: FlowRate::new(1),
            block_number: BlockNumber::new(block),
            log_index: LogIndex::new(log),
            tx_hash: TxHash::from_bytes([(block as u8) ^ (log as u8) ^ receiver_byte; 32]),
            timestamp: Timestamp::new(block * 12),
        }
    }

    #[test]
    fn groups_by_relationship() {
        let batch = vec![event(0xB0, 1, 0), event(0xB1, 1, 1), event(0xB0, 2, 0)];
        let groups = resequence(batch);

        assert_eq!(groups.len(), 2);
        let sizes: Vec<usize> = groups.iter().map(|(_, g)| g.len()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 3);
        assert!(sizes.contains(&2));
    }

    #[test]
    fn orders_within_a_group_by_position() {
        let batch = vec![event(0xB0, 3, 0), event(0xB0, 1, 4), event(0xB0, 1, 2)];
        let groups = resequence(batch);

        assert_eq!(groups.len(), 1);
        let positions: Vec<(u64, u64)> = groups[0]
            .1
            .iter()
            .map(|e| (e.block_number.as_u64(), e.log_index.as_u64()))
            .collect();
        assert_eq!(positions, vec![(1, 2), (1, 4), (3, 0)]);
    }

    #[test]
    fn empty_batch_yields_no_groups() {
        assert!(resequence(Vec::new()).is_empty());
    }
}
