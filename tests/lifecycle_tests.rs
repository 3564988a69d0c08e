use midibridge::midi::message_kind::{MIM_CLOSE, MIM_DATA, MIM_OPEN};
use midibridge::midi::MockBackend;
use midibridge::{ChannelHub, ChannelId, EventRecord, MmResult, SessionManager};
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(devices: usize) -> (SessionManager<MockBackend>, MockBackend, ChannelHub) {
    init();
    let names: Vec<String> = (1..=devices).map(|i| format!("Mock Device {}", i)).collect();
    let backend = MockBackend::new(names);
    let hub = ChannelHub::new();
    let manager = SessionManager::new(backend.clone(), Arc::new(hub.clone()));
    (manager, backend, hub)
}

fn assert_absent(manager: &SessionManager<MockBackend>, port: u32) {
    let table = manager.table().lock();
    assert!(!table.contains_port(port), "port {} still in table", port);
    assert_eq!(table.handle_for(port), None);
    assert_eq!(table.channel_for(port), None);
}

#[test]
fn test_open_start_event_stop_close_scenario() {
    let (manager, backend, hub) = setup(3);
    let events = hub.subscribe(ChannelId(42));

    assert_eq!(manager.open(2, ChannelId(42)), MmResult::NOERROR);
    assert_eq!(manager.start(2), MmResult::NOERROR);

    let handle = backend.handle_for_port(2).unwrap();
    assert!(backend.simulate_event(handle, MIM_DATA, 0x904090, 0));

    let record = events.try_recv().unwrap();
    assert_eq!(record.to_array(), [2, 0x3C3, 0, 0x904090, 0]);

    assert_eq!(manager.stop(2), MmResult::NOERROR);
    assert_eq!(manager.close(2), MmResult::NOERROR);
    assert_absent(&manager, 2);
    assert!(backend.open_handles().is_empty());
}

#[test]
fn test_open_populates_all_mappings() {
    let (manager, backend, _hub) = setup(2);

    assert_eq!(manager.open(1, ChannelId(7)), MmResult::NOERROR);
    let handle = backend.handle_for_port(1).unwrap();

    let table = manager.table().lock();
    assert_eq!(table.handle_for(1), Some(handle));
    assert_eq!(table.port_for(handle), Some(1));
    assert_eq!(table.channel_for(1), Some(ChannelId(7)));
}

#[test]
fn test_open_close_round_trip_restores_table() {
    let (manager, _backend, _hub) = setup(2);
    assert_eq!(manager.open(0, ChannelId(1)), MmResult::NOERROR);
    assert_eq!(manager.open(1, ChannelId(2)), MmResult::NOERROR);

    assert_eq!(manager.close(1), MmResult::NOERROR);
    assert_absent(&manager, 1);
    assert_eq!(manager.open_ports(), vec![0]);

    // Port becomes available again
    assert_eq!(manager.open(1, ChannelId(3)), MmResult::NOERROR);
    assert!(manager.is_open(1));
}

#[test]
fn test_double_open_is_rejected() {
    let (manager, backend, hub) = setup(1);
    let first = hub.subscribe(ChannelId(1));

    assert_eq!(manager.open(0, ChannelId(1)), MmResult::NOERROR);
    let handle = backend.handle_for_port(0).unwrap();
    assert_eq!(manager.open(0, ChannelId(2)), MmResult::ALLOCATED);

    // First session is untouched and no handle leaked
    assert_eq!(backend.open_handles(), vec![handle]);
    assert_eq!(manager.table().lock().channel_for(0), Some(ChannelId(1)));

    manager.start(0);
    backend.simulate_event(handle, MIM_DATA, 0x90, 0);
    assert_eq!(first.try_recv().unwrap().port, 0);
}

#[test]
fn test_failed_open_records_null_handle() {
    let (manager, backend, _hub) = setup(1);
    backend.fail_next_open(MmResult::NODRIVER);

    assert_eq!(manager.open(0, ChannelId(5)), MmResult::NODRIVER);
    {
        let table = manager.table().lock();
        assert!(table.handle_for(0).unwrap().is_null());
        assert_eq!(table.channel_for(0), Some(ChannelId(5)));
    }
    assert!(!manager.is_open(0));

    // A retry replaces the NULL entry
    assert_eq!(manager.open(0, ChannelId(6)), MmResult::NOERROR);
    assert!(manager.is_open(0));
    assert_eq!(manager.table().lock().channel_for(0), Some(ChannelId(6)));
}

#[test]
fn test_open_bad_device_id_passes_status_through() {
    let (manager, _backend, _hub) = setup(1);
    assert_eq!(manager.open(9, ChannelId(1)), MmResult::BADDEVICEID);
    assert_eq!(manager.start(9), MmResult::INVALHANDLE);
    assert_eq!(manager.close(9), MmResult::INVALHANDLE);
    assert_absent(&manager, 9);
}

#[test]
fn test_operations_on_unopened_port() {
    let (manager, _backend, _hub) = setup(1);
    assert_eq!(manager.start(0), MmResult::INVALHANDLE);
    assert_eq!(manager.stop(0), MmResult::INVALHANDLE);
    assert_eq!(manager.close(0), MmResult::INVALHANDLE);

    assert_eq!(manager.open(0, ChannelId(1)), MmResult::NOERROR);
    assert_eq!(manager.close(0), MmResult::NOERROR);
    assert_eq!(manager.close(0), MmResult::INVALHANDLE);
}

#[test]
fn test_data_only_delivered_while_started() {
    let (manager, backend, hub) = setup(1);
    let events = hub.subscribe(ChannelId(3));

    manager.open(0, ChannelId(3));
    let handle = backend.handle_for_port(0).unwrap();

    assert!(!backend.simulate_event(handle, MIM_DATA, 0x90, 0));
    manager.start(0);
    assert!(backend.is_started(handle));
    assert!(backend.simulate_event(handle, MIM_DATA, 0x90, 1));
    manager.stop(0);
    assert!(!backend.is_started(handle));
    assert!(!backend.simulate_event(handle, MIM_DATA, 0x90, 2));

    let received: Vec<EventRecord> = events.try_iter().collect();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].param2, 1);
}

#[test]
fn test_open_and_close_notifications() {
    let (manager, _backend, hub) = setup(1);
    let events = hub.subscribe(ChannelId(8));

    manager.open(0, ChannelId(8));
    manager.close(0);

    // The open notification fires before the session is recorded and is dropped.
    let kinds: Vec<u32> = events.try_iter().map(|r| r.message_kind).collect();
    assert!(!kinds.contains(&MIM_OPEN));
    assert_eq!(kinds, vec![MIM_CLOSE]);
}

#[test]
fn test_events_after_close_are_not_delivered() {
    let (manager, backend, hub) = setup(1);
    let events = hub.subscribe(ChannelId(1));

    manager.open(0, ChannelId(1));
    manager.start(0);
    let handle = backend.handle_for_port(0).unwrap();
    manager.close(0);

    assert!(!backend.simulate_event(handle, MIM_DATA, 0x90, 0));
    assert!(events.try_iter().all(|r| r.message_kind != MIM_DATA));
}

#[test]
fn test_ports_route_to_their_own_channels() {
    let (manager, backend, hub) = setup(2);
    let a = hub.subscribe(ChannelId(10));
    let b = hub.subscribe(ChannelId(20));

    manager.open(0, ChannelId(10));
    manager.open(1, ChannelId(20));
    manager.start(0);
    manager.start(1);

    backend.simulate_event(backend.handle_for_port(1).unwrap(), MIM_DATA, 0x91, 0);
    backend.simulate_event(backend.handle_for_port(0).unwrap(), MIM_DATA, 0x90, 0);

    assert_eq!(a.try_recv().unwrap().to_array(), [0, MIM_DATA, 0, 0x90, 0]);
    assert_eq!(b.try_recv().unwrap().to_array(), [1, MIM_DATA, 0, 0x91, 0]);
    assert!(a.try_recv().is_err());
}

#[test]
fn test_instance_tag_is_echoed() {
    init();
    let backend = MockBackend::default();
    let hub = ChannelHub::new();
    let events = hub.subscribe(ChannelId(1));
    let manager = SessionManager::with_instance_tag(backend.clone(), Arc::new(hub), 0xBEEF);

    manager.open(0, ChannelId(1));
    manager.start(0);
    backend.simulate_event(backend.handle_for_port(0).unwrap(), MIM_DATA, 0x90, 0);

    assert_eq!(events.try_recv().unwrap().instance_tag, 0xBEEF);
}

#[test]
fn test_close_all() {
    let (manager, backend, _hub) = setup(3);
    for port in 0..3 {
        manager.open(port, ChannelId(1));
    }

    let closed = manager.close_all();
    assert_eq!(
        closed,
        vec![
            (0, MmResult::NOERROR),
            (1, MmResult::NOERROR),
            (2, MmResult::NOERROR)
        ]
    );
    assert!(manager.open_ports().is_empty());
    assert!(backend.open_handles().is_empty());
}

#[test]
fn test_closure_sink() {
    init();
    let backend = MockBackend::default();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let sink = move |channel: ChannelId, record: EventRecord| {
        sink_seen.lock().unwrap().push((channel, record));
    };
    let manager = SessionManager::new(backend.clone(), Arc::new(sink));

    manager.open(1, ChannelId(99));
    manager.start(1);
    backend.simulate_event(backend.handle_for_port(1).unwrap(), MIM_DATA, 0x3C90, 4);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, ChannelId(99));
    assert_eq!(seen[0].1.to_array(), [1, MIM_DATA, 0, 0x3C90, 4]);
}
