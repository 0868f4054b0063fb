//! End-to-end reconciliation through the adapter, scheduler and executors.

use std::sync::Arc;

use relist_core::{DisplayedItem, FnDiffer, ItemSource, KeyedDiffer};
use relist_foundation::{
    BoundRow, ListAdapter, PagedList, ReconcilerConfig, RowType, SchedulerState,
    SourceRequest,
};
use relist_testing::{ManualExecutor, ReconcileTestRule, RenderedList};

// =============================================================================
// Test helpers
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
struct Post {
    local_id: u32,
    remote_id: Option<u64>,
    title: &'static str,
}

fn post(local_id: u32, title: &'static str) -> Post {
    Post {
        local_id,
        remote_id: None,
        title,
    }
}

type PostDiffer = KeyedDiffer<fn(&Post) -> u32>;

fn by_local_id() -> Arc<PostDiffer> {
    Arc::new(KeyedDiffer::new((|post: &Post| post.local_id) as fn(&Post) -> u32))
}

fn posts(range: std::ops::Range<u32>) -> PagedList<Post> {
    PagedList::from_items(range.map(|id| post(id, "post")))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Supersession
// =============================================================================

#[test]
fn superseded_large_update_never_reaches_the_view() {
    init_logging();
    let executor = ManualExecutor::new();
    let mut rule = ReconcileTestRule::new(
        &ReconcilerConfig::default(),
        by_local_id(),
        executor.shared(),
    );

    rule.submit_list(posts(0..100));
    let latest = rule.submit_list(PagedList::from_items([post(500, "only")]));
    assert_eq!(rule.adapter().state(), SchedulerState::Computing { request: latest });

    // Only the stale job reached the executor; the newer one waits for it
    assert_eq!(executor.pending(), 1);
    assert!(executor.run_next());
    assert_eq!(rule.drain().unwrap(), 0);
    assert_eq!(executor.pending(), 1);
    assert!(executor.run_next());
    rule.await_idle();

    assert_eq!(rule.rendered().items(), vec![post(500, "only")]);
    assert_eq!(
        rule.rendered().row_types(),
        vec![Some(RowType::Item), Some(RowType::EndOfList)]
    );
    assert_eq!(rule.rendered().stats().updates, 1);
}

#[test]
fn result_posted_before_a_newer_submit_is_dropped() {
    init_logging();
    let executor = ManualExecutor::new();
    let mut rule = ReconcileTestRule::new(
        &ReconcilerConfig::default(),
        by_local_id(),
        executor.shared(),
    );

    rule.submit_list(posts(0..3));
    // Finished and posted, but not drained yet
    executor.run_all();
    rule.submit_list(posts(10..12));
    executor.run_all();
    rule.await_idle();

    let ids: Vec<u32> = rule.rendered().items().iter().map(|p| p.local_id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(rule.rendered().stats().updates, 1);
}

#[test]
fn discarded_job_releases_the_held_one() {
    let executor = ManualExecutor::new();
    let mut rule = ReconcileTestRule::new(
        &ReconcilerConfig::default(),
        by_local_id(),
        executor.shared(),
    );

    rule.submit_list(posts(0..5));
    rule.submit_list(posts(5..7));
    rule.submit_list(posts(7..9));
    assert_eq!(executor.discard_all(), 1);
    // Only the newest held job survives
    assert_eq!(executor.pending(), 1);
    executor.run_all();
    rule.await_idle();

    let ids: Vec<u32> = rule.rendered().items().iter().map(|p| p.local_id).collect();
    assert_eq!(ids, vec![7, 8]);
}

#[test]
fn rapid_updates_on_the_worker_converge_to_the_last() {
    init_logging();
    let mut rule = ReconcileTestRule::with_worker(&ReconcilerConfig::default(), by_local_id());

    for round in 0..20u32 {
        rule.submit_list(posts(round..round + 50));
    }
    rule.await_idle();

    let ids: Vec<u32> = rule.rendered().items().iter().map(|p| p.local_id).collect();
    assert_eq!(ids, (19..69).collect::<Vec<_>>());
    assert_eq!(rule.rendered().stats().updates, 1);
}

#[test]
fn stepwise_updates_keep_rows_in_sync() {
    init_logging();
    let mut rule = ReconcileTestRule::with_worker(&ReconcilerConfig::default(), by_local_id());
    let steps: Vec<Vec<Post>> = vec![
        vec![post(1, "a"), post(2, "b"), post(3, "c")],
        vec![post(3, "c"), post(1, "a"), post(2, "b")],
        vec![post(3, "c"), post(2, "B"), post(4, "d")],
        vec![],
        vec![post(5, "e")],
    ];
    for step in steps {
        rule.submit_list(PagedList::from_items(step.clone()));
        rule.await_idle();
        assert_eq!(rule.rendered().items(), step);
    }
}

// =============================================================================
// Row model
// =============================================================================

#[test]
fn indicator_row_tracks_empty_transitions() {
    let mut rule = ReconcileTestRule::with_inline(&ReconcilerConfig::default(), by_local_id());
    rule.await_idle();
    assert_eq!(rule.rendered().len(), 0);

    rule.submit_list(posts(0..2));
    rule.await_idle();
    assert_eq!(rule.rendered().len(), 3);
    assert_eq!(rule.rendered().row(2), Some(&BoundRow::EndOfList));

    rule.submit(None);
    rule.await_idle();
    assert_eq!(rule.rendered().len(), 0);
    assert_eq!(rule.adapter().item_count(), 0);
}

#[test]
fn placeholders_render_as_loading_and_fetch_on_bind() {
    let mut rule = ReconcileTestRule::with_inline(&ReconcilerConfig::default(), by_local_id());
    let page = Arc::new(
        PagedList::new(vec![Some(post(1, "a")), None, Some(post(3, "c"))]).with_has_more(true),
    );
    rule.submit(Some(page.clone()));
    rule.await_idle();

    assert_eq!(
        rule.rendered().row_types(),
        vec![
            Some(RowType::Item),
            Some(RowType::Loading),
            Some(RowType::Item),
            Some(RowType::EndOfList)
        ]
    );
    assert_eq!(
        rule.adapter().current_displayed_item(1).unwrap(),
        DisplayedItem::Placeholder
    );

    // Binding asked for the missing post and for the next page
    let mut requests = page.take_requests();
    requests.sort_by_key(|request| match request {
        SourceRequest::Fetch(position) => *position,
        SourceRequest::LoadMore => usize::MAX,
    });
    assert_eq!(requests, vec![SourceRequest::Fetch(1), SourceRequest::LoadMore]);
}

#[test]
fn loaded_placeholder_is_inserted_not_changed() {
    let mut rule = ReconcileTestRule::with_inline(&ReconcilerConfig::default(), by_local_id());
    rule.submit_list(PagedList::new(vec![Some(post(1, "a")), None]));
    rule.await_idle();

    rule.submit_list(PagedList::new(vec![Some(post(1, "a")), Some(post(2, "b"))]));
    rule.await_idle();

    let stats = rule.rendered().stats();
    assert_eq!(stats.changed, 0);
    assert_eq!((stats.inserted, stats.removed), (2 + 1 + 1, 1));
    assert_eq!(rule.rendered().items(), vec![post(1, "a"), post(2, "b")]);
}

#[test]
fn diff_reads_never_request_fetches() {
    let executor = ManualExecutor::new();
    let mut adapter =
        ListAdapter::new(&ReconcilerConfig::default(), by_local_id(), executor.shared());
    let mut view = RenderedList::<Post>::new();
    let first = Arc::new(PagedList::new(vec![None, Some(post(2, "b")), None]).with_has_more(true));
    let second = Arc::new(
        PagedList::new(vec![None, None, Some(post(2, "b")), None]).with_has_more(true),
    );

    adapter.submit(Some(first.clone()));
    executor.run_all();
    adapter.drain(&mut view).unwrap();
    adapter.submit(Some(second.clone()));
    executor.run_all();
    adapter.drain(&mut view).unwrap();

    assert_eq!(view.len(), 5);
    assert!(first.take_requests().is_empty());
    assert!(second.take_requests().is_empty());

    // Binding is what asks for data
    view.bind_dirty(&adapter).unwrap();
    assert!(second.take_requests().contains(&SourceRequest::Fetch(0)));
}

// =============================================================================
// Identity
// =============================================================================

struct RemotePosts(Vec<Post>);

impl ItemSource for RemotePosts {
    type Item = Post;

    fn size(&self) -> usize {
        self.0.len()
    }

    fn get_item(&self, position: usize, _fetch: bool, _paginate: bool) -> Option<Post> {
        self.0.get(position).cloned()
    }

    fn stable_id_at(&self, position: usize) -> Option<u64> {
        self.0.get(position).and_then(|post| post.remote_id)
    }
}

#[test]
fn uploaded_draft_is_changed_in_place() {
    let differ = Arc::new(FnDiffer::new(
        |old: &Post, new: &Post| match (old.remote_id, new.remote_id) {
            (Some(a), Some(b)) => a == b,
            _ => old.local_id == new.local_id,
        },
        |old: &Post, new: &Post| old == new,
    ));
    let mut rule = ReconcileTestRule::with_inline(&ReconcilerConfig::default(), differ);

    let draft = post(7, "draft");
    let published = Post {
        remote_id: Some(70),
        ..draft.clone()
    };
    rule.submit_list(RemotePosts(vec![post(1, "x"), draft]));
    rule.await_idle();
    rule.submit_list(RemotePosts(vec![post(1, "x"), published.clone()]));
    rule.await_idle();

    let stats = rule.rendered().stats();
    assert_eq!(stats.changed, 1);
    assert_eq!(stats.moved, 0);
    assert_eq!(rule.rendered().row(1), Some(&BoundRow::Item(published)));
}

// =============================================================================
// Position
// =============================================================================

#[test]
fn first_visible_item_keeps_its_key_across_inserts() {
    let mut rule = ReconcileTestRule::with_inline(&ReconcilerConfig::default(), by_local_id());
    let keyed = |ids: &[u64]| {
        PagedList::from_items(ids.iter().map(|&id| post(id as u32, "p")))
            .with_stable_ids(ids.iter().map(|&id| Some(id)).collect())
    };

    rule.submit_list(keyed(&[10, 20, 30, 40]));
    rule.await_idle();
    rule.rendered().position().update_scroll_position_with_key(2, 8.0, Some(30));

    rule.submit_list(keyed(&[1, 2, 10, 20, 30, 40]));
    rule.await_idle();

    let position = rule.rendered().position();
    assert_eq!(position.first_visible_item_index(), 4);
    assert_eq!(position.first_visible_item_scroll_offset(), 8.0);
    assert_eq!(position.first_visible_item_key(), Some(30));
}

#[test]
fn first_visible_index_is_clamped_when_its_item_goes_away() {
    let mut rule = ReconcileTestRule::with_inline(&ReconcilerConfig::default(), by_local_id());
    rule.submit_list(posts(0..10));
    rule.await_idle();
    rule.rendered().position().scroll_to_item(9, 0.0);

    rule.submit_list(posts(0..3));
    rule.await_idle();
    // Three posts plus the end-of-list row
    assert_eq!(rule.rendered().position().first_visible_item_index(), 3);
}

// =============================================================================
// Consumers without the test rule
// =============================================================================

#[test]
fn adapter_drives_a_plain_consumer() {
    let config = ReconcilerConfig::default().end_of_list_indicator(false);
    let executor = ManualExecutor::new();
    let mut adapter = ListAdapter::new(&config, by_local_id(), executor.shared());
    let mut view = RenderedList::<Post>::new();

    adapter.submit(Some(Arc::new(posts(0..4))));
    assert_eq!(adapter.drain(&mut view).unwrap(), 0);
    executor.run_all();
    assert_eq!(adapter.drain(&mut view).unwrap(), 1);
    assert_eq!(view.len(), 4);
    assert_eq!(view.bind_dirty(&adapter).unwrap(), 4);
    let expected: Vec<Post> = (0..4).map(|id| post(id, "post")).collect();
    assert_eq!(view.items(), expected);
}
