mod support;

use client::{ConnectionState, FieldValue, SnapshotOutcome, SnapshotRejection};
use schema::{player_field, Schema};
use support::{
    connected, current_frame, current_numbers, deliver, frame, frame_index, Delta, Frame,
    Gamestate, MessageBuilder, TestHost,
};

fn accept(connection: &mut client::ClientConnection, host: &mut TestHost, sequence: i32, frame: &Frame) {
    let data = MessageBuilder::new(0).snapshot(frame).finish();
    let report = deliver(connection, host, sequence, &data).unwrap();
    assert_eq!(report.snapshots.len(), 1);
    assert!(report.snapshots[0].is_accepted(), "{:?}", report.snapshots[0]);
}

#[test]
fn gamestate_then_keyframe_reproduces_wire_state() {
    let schema = Schema::standard();
    let health = schema.player.index_of(player_field::HEALTH).unwrap();
    let mut connection = connected();
    let mut host = TestHost::default();

    let mut gamestate = Gamestate::on_map("q3dm6");
    gamestate.command_sequence = 4;
    gamestate.client_num = 2;
    gamestate.checksum_feed = 1234;
    gamestate.baselines = vec![(9, frame(90))];
    let data = MessageBuilder::new(0).gamestate(&gamestate).finish();
    let report = deliver(&mut connection, &mut host, 1, &data).unwrap();

    assert!(report.gamestate);
    assert_eq!(connection.state(), ConnectionState::Loading);
    assert_eq!(connection.client_num(), 2);
    assert_eq!(connection.server_info().map_name, "q3dm6");
    assert_eq!(connection.system_info().server_id, 7);
    assert_eq!(connection.server_command_sequence(), 4);
    assert_eq!(host.restarts, vec![1234]);
    assert_eq!(host.maps, vec!["q3dm6".to_owned()]);
    assert_eq!(
        connection.baselines().get(9).fields[frame_index()],
        FieldValue::UInt(90)
    );

    let keyframe = Frame {
        server_time: 1000,
        area_mask: vec![0xff, 0x01],
        command_time: Some(980),
        player: vec![(health, FieldValue::SInt(-5))],
        entities: vec![(4, frame(40)), (9, Delta::Unchanged)],
        ..Frame::default()
    };
    accept(&mut connection, &mut host, 2, &keyframe);

    assert_eq!(connection.state(), ConnectionState::Active);
    let snapshot = connection.current_snapshot();
    assert!(snapshot.valid);
    assert_eq!(snapshot.delta_num, None);
    assert_eq!(snapshot.server_time, 1000);
    assert_eq!(snapshot.area_mask, vec![0xff, 0x01]);
    assert_eq!(snapshot.player.command_time, 980);
    assert_eq!(
        snapshot.player.field(&schema.player, player_field::HEALTH),
        Some(FieldValue::SInt(-5))
    );
    assert_eq!(snapshot.num_entities, 2);
    assert_eq!(current_numbers(&connection), vec![4, 9]);
    assert_eq!(current_frame(&connection, 4), Some(FieldValue::UInt(40)));
    assert_eq!(current_frame(&connection, 9), Some(FieldValue::UInt(90)));
    assert!(connection.take_new_snapshot());
}

#[test]
fn removed_baseline_keeps_full_field_bag() {
    let schema = Schema::standard();
    let mut connection = connected();
    let mut host = TestHost::default();
    let mut gamestate = Gamestate::on_map("q3dm1");
    gamestate.baselines = vec![(9, Delta::Removed)];
    let data = MessageBuilder::new(0).gamestate(&gamestate).finish();
    deliver(&mut connection, &mut host, 1, &data).unwrap();
    assert_eq!(
        connection.baselines().get(9).fields.len(),
        schema.entity.fields.len()
    );

    accept(
        &mut connection,
        &mut host,
        2,
        &Frame::keyframe(100, vec![(9, Delta::Unchanged)]),
    );
    assert_eq!(current_numbers(&connection), vec![9]);
    let entity = connection.current_entities().next().unwrap();
    assert_eq!(entity.fields.len(), schema.entity.fields.len());
    assert_eq!(current_frame(&connection, 9), Some(FieldValue::UInt(0)));
}

#[test]
fn unchanged_modified_new_and_removed_entities() {
    let mut connection = connected();
    let mut host = TestHost::default();
    let mut gamestate = Gamestate::on_map("q3dm1");
    gamestate.baselines = vec![
        (7, frame(70)),
        (9, frame(90)),
    ];
    let data = MessageBuilder::new(0).gamestate(&gamestate).finish();
    deliver(&mut connection, &mut host, 1, &data).unwrap();

    accept(
        &mut connection,
        &mut host,
        2,
        &Frame::keyframe(100, vec![(4, frame(40)), (7, Delta::Unchanged)]),
    );
    assert_eq!(current_numbers(&connection), vec![4, 7]);

    // 4 is not mentioned, 7 changes, 9 appears from its baseline.
    accept(
        &mut connection,
        &mut host,
        3,
        &Frame::delta(150, 1, vec![(7, frame(71)), (9, Delta::Unchanged)]),
    );
    assert_eq!(current_numbers(&connection), vec![4, 7, 9]);
    assert_eq!(connection.current_snapshot().num_entities, 3);
    assert_eq!(connection.current_snapshot().delta_num, Some(2));
    assert_eq!(current_frame(&connection, 4), Some(FieldValue::UInt(40)));
    assert_eq!(current_frame(&connection, 7), Some(FieldValue::UInt(71)));
    assert_eq!(current_frame(&connection, 9), Some(FieldValue::UInt(90)));

    accept(
        &mut connection,
        &mut host,
        4,
        &Frame::delta(200, 1, vec![(4, Delta::Removed)]),
    );
    assert_eq!(current_numbers(&connection), vec![7, 9]);
    assert_eq!(connection.current_snapshot().num_entities, 2);
    assert_eq!(current_frame(&connection, 7), Some(FieldValue::UInt(71)));
}

#[test]
fn gap_invalidates_skipped_slots() {
    let mut connection = connected();
    let mut host = TestHost::default();

    // History capacity is 8: messages 8 and 9 share slots with 0 and 1.
    accept(&mut connection, &mut host, 1, &Frame::keyframe(50, vec![]));
    for sequence in 5..=7 {
        accept(
            &mut connection,
            &mut host,
            sequence,
            &Frame::keyframe(sequence * 50, vec![]),
        );
    }
    assert!(connection.snapshot(1).is_some());

    accept(&mut connection, &mut host, 10, &Frame::keyframe(500, vec![]));
    assert!(connection.snapshot(1).is_none());
    assert_eq!(
        connection.history().base(1),
        Err(SnapshotRejection::InvalidBase { delta_num: 1 })
    );
    for sequence in [5, 6, 7, 10] {
        assert!(connection.snapshot(sequence).is_some(), "{sequence}");
    }

    // A delta from message 9 refers to a slot invalidated by the gap.
    let data = MessageBuilder::new(0)
        .snapshot(&Frame::delta(550, 2, vec![]))
        .finish();
    let report = deliver(&mut connection, &mut host, 11, &data).unwrap();
    assert_eq!(
        report.snapshots[0].outcome,
        SnapshotOutcome::Rejected(SnapshotRejection::InvalidBase { delta_num: 9 })
    );
}

#[test]
fn wrapped_base_is_rejected_and_stream_stays_in_sync() {
    let mut connection = connected();
    let mut host = TestHost::default();
    for sequence in 1..=9 {
        accept(
            &mut connection,
            &mut host,
            sequence,
            &Frame::keyframe(sequence * 50, vec![(3, frame(sequence as u32))]),
        );
    }

    // Message 1's slot now holds message 9.
    let data = MessageBuilder::new(0)
        .snapshot(&Frame {
            server_time: 500,
            delta: 9,
            command_time: Some(480),
            area_mask: vec![1, 2, 3],
            entities: vec![(3, frame(99)), (5, frame(55)), (6, Delta::Removed)],
            ..Frame::default()
        })
        .server_command(1, "print hello")
        .finish();
    let report = deliver(&mut connection, &mut host, 10, &data).unwrap();

    assert_eq!(
        report.snapshots[0].outcome,
        SnapshotOutcome::Rejected(SnapshotRejection::BaseTooOld {
            delta_num: 1,
            stored: 9
        })
    );
    // The command after the snapshot was read from the right offset.
    assert_eq!(connection.server_command(1), Ok("print hello"));
    assert_eq!(connection.next_server_command(), Some((1, "print hello")));
    assert_eq!(connection.current_snapshot().message_num, 9);
    assert!(connection.snapshot(10).is_none());
    assert_eq!(current_frame(&connection, 3), Some(FieldValue::UInt(9)));
}

#[test]
fn overwritten_pool_entities_reject_the_base() {
    let mut connection = connected();
    let mut host = TestHost::default();
    let crowd = |start: u16| -> Vec<(u16, Delta)> {
        (start..start + 60).map(|number| (number, frame(1))).collect()
    };

    accept(&mut connection, &mut host, 1, &Frame::keyframe(50, crowd(0)));
    for sequence in 2..=4 {
        accept(
            &mut connection,
            &mut host,
            sequence,
            &Frame::keyframe(sequence * 50, crowd(100)),
        );
    }
    // The slot is intact; only the pool has moved on.
    assert!(connection.snapshot(1).is_some());
    assert_eq!(connection.entity_pool().written(), 240);

    let data = MessageBuilder::new(0)
        .snapshot(&Frame::delta(250, 4, vec![(0, frame(2))]))
        .finish();
    let report = deliver(&mut connection, &mut host, 5, &data).unwrap();
    assert_eq!(
        report.snapshots[0].outcome,
        SnapshotOutcome::Rejected(SnapshotRejection::BaseEntitiesOverwritten {
            distance: 240,
            limit: 192
        })
    );
    assert_eq!(connection.current_snapshot().message_num, 4);
}

#[test]
fn rejected_snapshot_does_not_raise_new_snapshot() {
    let mut connection = connected();
    let mut host = TestHost::default();
    let data = MessageBuilder::new(0)
        .snapshot(&Frame::delta(100, 1, vec![(2, frame(2))]))
        .finish();
    let report = deliver(&mut connection, &mut host, 3, &data).unwrap();
    assert!(!report.snapshots[0].is_accepted());
    assert!(!connection.take_new_snapshot());
    assert!(!connection.current_snapshot().valid);
}

#[test]
fn server_restart_resets_start_time() {
    let mut connection = connected();
    let mut host = TestHost::default();
    accept(&mut connection, &mut host, 1, &Frame::keyframe(100, vec![]));
    assert_eq!(connection.server_start_time(), 0);

    let mut restarted = Frame::keyframe(5000, vec![]);
    restarted.flags = wire::SnapFlags::SERVERCOUNT;
    accept(&mut connection, &mut host, 2, &restarted);
    assert_eq!(connection.server_start_time(), 5000);
}

#[test]
fn ping_uses_recorded_packets() {
    let mut connection = connected();
    let mut host = TestHost::default();
    connection.record_outgoing_packet(900, 20);
    connection.record_outgoing_packet(950, 60);

    let keyframe = Frame {
        server_time: 1000,
        command_time: Some(920),
        ..Frame::default()
    };
    accept(&mut connection, &mut host, 2, &keyframe);
    // Delivered at realtime 100; the packet sent at 20 covered server time 900.
    assert_eq!(connection.current_snapshot().ping, 80);
}

#[test]
fn snapshot_events_are_kept() {
    let mut connection = connected();
    let mut host = TestHost::default();
    let event = client::SnapshotEvent {
        entity: 3,
        sound_index: 17,
        channel: 1,
        volume: 200,
    };
    let mut keyframe = Frame::keyframe(100, vec![(3, frame(1))]);
    keyframe.events = vec![event];
    accept(&mut connection, &mut host, 1, &keyframe);
    assert_eq!(connection.current_snapshot().events, vec![event]);
}
