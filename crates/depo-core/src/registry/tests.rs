use super::*;

fn flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn patch(id: u64, state: RowState, warnings: usize) -> RowPatch {
    let mut status = RowStatus::new(id, id as usize + 1);
    status.advance(RowState::Parsing);
    status.advance(state);
    status.warnings = (0..warnings).map(|i| format!("w{}", i)).collect();
    if state == RowState::Error {
        status
            .errors
            .push(DataError::new(DataErrorKind::InvalidInputData, "bad"));
    }
    RowPatch {
        status,
        complete: state.is_final(),
    }
}

#[test]
fn applies_patches_and_orders_snapshot_by_id() {
    let reg = RowRegistry::new(RegistryLimits::default());
    reg.register(2, 3, flag());
    reg.register(1, 2, flag());

    assert_eq!(reg.apply(patch(2, RowState::Parsing, 0)), Ack::Continue);
    assert_eq!(reg.apply(patch(1, RowState::Valid, 0)), Ack::Continue);

    let snap = reg.snapshot();
    assert_eq!(snap.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(snap[0].state, RowState::Valid);
    assert_eq!(snap[1].state, RowState::Parsing);
    assert!(!reg.all_settled());
}

#[test]
fn unknown_row_is_told_to_stop() {
    let reg = RowRegistry::new(RegistryLimits::default());
    assert_eq!(reg.apply(patch(9, RowState::Parsing, 0)), Ack::StopBatch);
}

#[test]
fn final_status_is_observed_once() {
    let reg = RowRegistry::new(RegistryLimits::default());
    reg.register(1, 2, flag());
    assert_eq!(reg.apply(patch(1, RowState::Error, 0)), Ack::Continue);
    // A late patch can neither flip the state nor count the row twice.
    assert_eq!(reg.apply(patch(1, RowState::Valid, 0)), Ack::StopBatch);
    assert_eq!(reg.status(1).unwrap().state, RowState::Error);
    assert_eq!(reg.failed_rows(), 1);
}

#[test]
fn max_errors_halts_unsettled_rows() {
    let reg = RowRegistry::new(RegistryLimits {
        max_errors: 2,
        max_warnings: 0,
    });
    let flags: Vec<_> = (1..=4).map(|_| flag()).collect();
    for (i, f) in flags.iter().enumerate() {
        reg.register(i as u64 + 1, i + 2, Arc::clone(f));
    }
    reg.apply(patch(1, RowState::Valid, 0));
    reg.apply(patch(2, RowState::Error, 0));
    assert!(reg.halt_reason().is_none());
    reg.apply(patch(3, RowState::Error, 0));

    assert!(reg.halt_reason().is_some());
    assert!(flags[3].load(Ordering::Acquire));
    let row4 = reg.status(4).unwrap();
    assert_eq!(row4.state, RowState::Error);
    assert_eq!(row4.errors[0].kind, DataErrorKind::BatchHalted);
    // Settled rows keep their own outcome.
    assert_eq!(reg.status(1).unwrap().state, RowState::Valid);
    assert_eq!(reg.apply(patch(4, RowState::Parsing, 0)), Ack::StopBatch);
    assert!(reg.all_settled());
}

#[test]
fn halted_registry_rejects_new_rows() {
    let reg = RowRegistry::new(RegistryLimits::default());
    reg.halt("user stop");
    let f = flag();
    reg.register(1, 2, Arc::clone(&f));
    assert!(f.load(Ordering::Acquire));
    assert_eq!(reg.status(1).unwrap().state, RowState::Error);
}

#[test]
fn warnings_are_folded_past_the_limit() {
    let reg = RowRegistry::new(RegistryLimits {
        max_errors: 0,
        max_warnings: 2,
    });
    reg.register(1, 2, flag());
    reg.apply(patch(1, RowState::Parsing, 5));
    let w = reg.status(1).unwrap().warnings;
    assert_eq!(w, vec!["w0", "w1", "… and 3 more"]);
}

#[test]
fn fail_row_and_settle_are_backstops() {
    let reg = RowRegistry::new(RegistryLimits::default());
    reg.register(1, 2, flag());
    reg.register(2, 3, flag());

    reg.fail_row(1, DataError::new(DataErrorKind::UnhandledError, "row task panicked"));
    let s1 = reg.status(1).unwrap();
    assert_eq!(s1.state, RowState::Error);
    assert_eq!(s1.errors[0].kind, DataErrorKind::UnhandledError);

    reg.settle(&patch(2, RowState::Valid, 0).status);
    assert_eq!(reg.status(2).unwrap().state, RowState::Valid);
    // Already final: ignored.
    reg.settle(&patch(2, RowState::Error, 0).status);
    assert_eq!(reg.status(2).unwrap().state, RowState::Valid);
    assert_eq!(reg.failed_rows(), 1);
}
