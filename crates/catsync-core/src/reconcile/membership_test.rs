use super::*;
use crate::reconcile::memory::MemoryStore;

const KIND: MembershipKind = MembershipKind::ProductFacetValue;

fn plan(pairs: &[(i64, i64)]) -> MembershipPlan {
    let mut plan = MembershipPlan::new(KIND);
    for (o, m) in pairs {
        plan.add(*o, *m);
    }
    plan
}

#[tokio::test]
async fn replace_swaps_stale_for_new_and_keeps_retained() {
    let store = MemoryStore::default();
    store.seed_membership(KIND, 1, 11);
    store.seed_membership(KIND, 1, 12);
    let scope = MembershipScope::Nodes(vec![11, 12, 13]);
    let mut ctx = ReconcilerContext::new("test");

    apply_memberships(
        &store,
        &mut ctx,
        &plan(&[(1, 12), (1, 13)]),
        MembershipMode::Replace,
        &scope,
        500,
    )
    .await
    .unwrap();

    let rows = store.memberships(KIND);
    assert_eq!(rows, [(1, 12), (1, 13)].into_iter().collect());
    assert_eq!(ctx.summary.removed(KIND), 1);
    assert_eq!(ctx.summary.inserted(KIND), 1);
}

#[tokio::test]
async fn replace_leaves_out_of_scope_members() {
    let store = MemoryStore::default();
    store.seed_membership(KIND, 1, 11);
    store.seed_membership(KIND, 1, 99);
    let mut ctx = ReconcilerContext::new("test");

    apply_memberships(
        &store,
        &mut ctx,
        &plan(&[(1, 12)]),
        MembershipMode::Replace,
        &MembershipScope::Nodes(vec![11, 12]),
        500,
    )
    .await
    .unwrap();

    let rows = store.memberships(KIND);
    assert!(rows.contains(&(1, 99)), "unrelated facet value must survive");
    assert!(!rows.contains(&(1, 11)));
    assert!(rows.contains(&(1, 12)));
}

#[tokio::test]
async fn replace_does_not_touch_other_owners() {
    let store = MemoryStore::default();
    store.seed_membership(KIND, 2, 11);
    let mut ctx = ReconcilerContext::new("test");

    apply_memberships(
        &store,
        &mut ctx,
        &plan(&[(1, 12)]),
        MembershipMode::Replace,
        &MembershipScope::All,
        500,
    )
    .await
    .unwrap();

    assert!(store.memberships(KIND).contains(&(2, 11)));
}

#[tokio::test]
async fn additive_never_deletes() {
    let store = MemoryStore::default();
    store.seed_membership(KIND, 1, 11);
    let mut ctx = ReconcilerContext::new("test");

    apply_memberships(
        &store,
        &mut ctx,
        &plan(&[(1, 12)]),
        MembershipMode::Additive,
        &MembershipScope::All,
        500,
    )
    .await
    .unwrap();

    assert_eq!(store.memberships(KIND).len(), 2);
    assert_eq!(ctx.summary.removed(KIND), 0);
}

#[tokio::test]
async fn second_apply_writes_nothing() {
    let store = MemoryStore::default();
    let p = plan(&[(1, 11), (1, 12), (2, 11)]);
    let scope = MembershipScope::All;

    let mut first = ReconcilerContext::new("first");
    apply_memberships(&store, &mut first, &p, MembershipMode::Replace, &scope, 1)
        .await
        .unwrap();
    let calls_after_first = store.insert_calls();

    let mut second = ReconcilerContext::new("second");
    apply_memberships(&store, &mut second, &p, MembershipMode::Replace, &scope, 1)
        .await
        .unwrap();

    assert_eq!(first.summary.inserted(KIND), 3);
    assert_eq!(second.summary.inserted(KIND), 0);
    assert_eq!(second.summary.removed(KIND), 0);
    assert_eq!(store.insert_calls(), calls_after_first);
    assert_eq!(store.memberships(KIND).len(), 3);
}

#[tokio::test]
async fn batches_are_chunked_by_owner() {
    let store = MemoryStore::default();
    let p = plan(&[(1, 10), (2, 10), (3, 10), (4, 10), (5, 10)]);
    let mut ctx = ReconcilerContext::new("test");

    apply_memberships(&store, &mut ctx, &p, MembershipMode::Additive, &MembershipScope::All, 2)
        .await
        .unwrap();

    assert_eq!(store.insert_calls(), 3);
    assert_eq!(ctx.summary.inserted(KIND), 5);
}

#[tokio::test]
async fn failed_batch_reports_its_owners() {
    let store = MemoryStore::default();
    store.fail_inserts();
    let mut ctx = ReconcilerContext::new("test");

    let err = apply_memberships(
        &store,
        &mut ctx,
        &plan(&[(7, 1), (8, 1)]),
        MembershipMode::Additive,
        &MembershipScope::All,
        500,
    )
    .await
    .unwrap_err();

    match err {
        ReconcileError::BatchApply {
            kind, pairs, owners, ..
        } => {
            assert_eq!(kind, KIND);
            assert_eq!(pairs, 2);
            assert_eq!(owners, vec![7, 8]);
        }
        other => panic!("expected BatchApply, got {other:?}"),
    }
}

#[tokio::test]
async fn dry_run_counts_without_writing() {
    let store = MemoryStore::default();
    store.seed_membership(KIND, 1, 11);
    let mut ctx = ReconcilerContext::new("test").dry_run(true);

    apply_memberships(
        &store,
        &mut ctx,
        &plan(&[(1, 12)]),
        MembershipMode::Replace,
        &MembershipScope::All,
        500,
    )
    .await
    .unwrap();

    assert_eq!(ctx.summary.inserted(KIND), 1);
    assert_eq!(ctx.summary.removed(KIND), 1);
    assert_eq!(store.memberships(KIND), [(1, 11)].into_iter().collect());
}

#[test]
fn plan_dedupes_pairs() {
    let p = plan(&[(1, 11), (1, 11), (2, 11)]);
    assert_eq!(p.owner_count(), 2);
    assert_eq!(p.pair_count(), 2);
}
