//! Unit tests for flowdex-query, run against hand-built tables.

use flowdex_kernel::reduce;
use flowdex_store::Tables;
use flowdex_types::{
    ActivityType, Address, BlockNumber, FlowRate, FlowUpdateEvent, LogIndex, StreamId, Timestamp,
    TxHash,
};

use crate::executor::{list_activities, list_streams};
use crate::filter::{ActivityFilter, Page, ScanOrder, StreamFilter, StreamOrder};

// ============================================================================
// Test Helpers
// ============================================================================

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn alice() -> Address {
    addr(0xA1)
}

fn bob() -> Address {
    addr(0xB0)
}

fn carol() -> Address {
    addr(0xC0)
}

fn usdc() -> Address {
    addr(0x01)
}

fn dai() -> Address {
    addr(0x02)
}

fn apply(
    tables: &mut Tables,
    sender: Address,
    receiver: Address,
    token: Address,
    rate: i128,
    block: u64,
    tx_byte: u8,
    timestamp: u64,
) {
    let event = FlowUpdateEvent {
        token,
        sender,
        receiver,
        flow_rate: FlowRate::new(rate),
        block_number: BlockNumber::new(block),
        log_index: LogIndex::new(0),
        tx_hash: TxHash::from_bytes([tx_byte; 32]),
        timestamp: Timestamp::new(timestamp),
    };
    let write_set = reduce(tables, &event)
        .expect("reduce failed")
        .into_write_set()
        .expect("unexpected duplicate");
    tables.commit(write_set);
}

/// Three relationships:
/// - alice→bob in USDC: opened, closed, reopened (two lives)
/// - alice→carol in DAI: open
/// - bob→alice in USDC: open
fn fixture() -> Tables {
    let mut tables = Tables::new();
    apply(&mut tables, alice(), bob(), usdc(), 100, 1, 0x01, 1000);
    apply(&mut tables, alice(), carol(), dai(), 7, 2, 0x02, 1500);
    apply(&mut tables, alice(), bob(), usdc(), 0, 3, 0x03, 2000);
    apply(&mut tables, bob(), alice(), usdc(), 9, 4, 0x04, 2500);
    apply(&mut tables, alice(), bob(), usdc(), 50, 5, 0x05, 3000);
    tables
}

// ============================================================================
// Stream listings
// ============================================================================

#[test]
fn unfiltered_listing_returns_every_stream() {
    let tables = fixture();
    let rows = list_streams(
        &tables,
        &StreamFilter::any(),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::first(),
    );
    assert_eq!(rows.len(), 4);

    // Ascending createdAt: first life first.
    assert_eq!(rows[0].created_at, Timestamp::new(1000));
    assert_eq!(rows[3].created_at, Timestamp::new(3000));
}

#[test]
fn sender_filter_narrows_to_outgoing_streams() {
    let tables = fixture();
    let rows = list_streams(
        &tables,
        &StreamFilter::any().with_sender(alice()),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::first(),
    );
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|s| s.sender == alice()));
}

#[test]
fn token_and_receiver_filters_compose() {
    let tables = fixture();
    let filter = StreamFilter::any()
        .with_receiver(bob())
        .with_token(usdc());
    let rows = list_streams(
        &tables,
        &filter,
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::first(),
    );

    // Both lives of alice→bob, nothing else.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.revision_index, 0);
    assert_eq!(rows[1].id.revision_index, 1);
}

#[test]
fn flow_rate_predicate_splits_open_and_closed() {
    let tables = fixture();

    let closed = list_streams(
        &tables,
        &StreamFilter::any().with_flow_rate_is_zero(true),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::first(),
    );
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].flow_rate, FlowRate::ZERO);

    let open = list_streams(
        &tables,
        &StreamFilter::any().with_flow_rate_is_zero(false),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::first(),
    );
    assert_eq!(open.len(), 3);
    assert!(open.iter().all(|s| !s.flow_rate.is_zero()));
}

#[test]
fn updated_at_descending_puts_freshest_first() {
    let tables = fixture();
    let rows = list_streams(
        &tables,
        &StreamFilter::any(),
        StreamOrder::UpdatedAt,
        ScanOrder::Descending,
        Page::first(),
    );

    // Second life of alice→bob was touched last.
    assert_eq!(rows[0].updated_at, Timestamp::new(3000));
    let updated: Vec<u64> = rows.iter().map(|s| s.updated_at.as_secs()).collect();
    let mut sorted = updated.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(updated, sorted);
}

#[test]
fn pagination_windows_the_result() {
    let tables = fixture();
    let all = list_streams(
        &tables,
        &StreamFilter::any(),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::first(),
    );

    let second_page = list_streams(
        &tables,
        &StreamFilter::any(),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::new(2, 2),
    );
    assert_eq!(second_page.as_slice(), &all[2..4]);

    let past_the_end = list_streams(
        &tables,
        &StreamFilter::any(),
        StreamOrder::CreatedAt,
        ScanOrder::Ascending,
        Page::new(10, 5),
    );
    assert!(past_the_end.is_empty());
}

// ============================================================================
// Activity listings
// ============================================================================

#[test]
fn activities_for_one_stream_in_event_order() {
    let tables = fixture();
    let first_life = StreamId::new(alice(), bob(), usdc(), 0);

    let rows = list_activities(
        &tables,
        &ActivityFilter::any().with_stream_id(first_life),
        ScanOrder::Ascending,
        Page::first(),
    );

    let types: Vec<ActivityType> = rows.iter().map(|a| a.activity_type).collect();
    assert_eq!(types, vec![ActivityType::Create, ActivityType::Delete]);
}

#[test]
fn participant_filter_sees_both_directions() {
    let tables = fixture();

    // bob participates in both alice→bob lives and bob→alice.
    let rows = list_activities(
        &tables,
        &ActivityFilter::any().with_participant(bob()),
        ScanOrder::Descending,
        Page::first(),
    );
    assert_eq!(rows.len(), 4);

    // carol only ever appears on the DAI stream.
    let rows = list_activities(
        &tables,
        &ActivityFilter::any().with_participant(carol()),
        ScanOrder::Descending,
        Page::first(),
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stream_id.receiver, carol());
}

#[test]
fn descending_is_the_newest_first_view() {
    let tables = fixture();
    let rows = list_activities(
        &tables,
        &ActivityFilter::any(),
        ScanOrder::Descending,
        Page::first(),
    );

    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].timestamp, Timestamp::new(3000));
    assert_eq!(rows[4].timestamp, Timestamp::new(1000));
}

#[test]
fn activity_pagination_applies_after_ordering() {
    let tables = fixture();
    let top_two = list_activities(
        &tables,
        &ActivityFilter::any(),
        ScanOrder::Descending,
        Page::new(0, 2),
    );
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[0].timestamp, Timestamp::new(3000));
    assert_eq!(top_two[1].timestamp, Timestamp::new(2500));
}
