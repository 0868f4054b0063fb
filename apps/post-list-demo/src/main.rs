mod posts;

use std::error::Error;
use std::sync::Arc;
use std::thread::{self, Thread};
use std::time::Duration;

use futures_task::ArcWake;
use relist::prelude::*;

use posts::{post_differ, Post, PostDiffer, PostStatus, PostStore};

type PostAdapter = ListAdapter<PagedList<Post>, PostDiffer>;

/// Unparks the UI thread when a diff result is posted.
struct Unparker(Thread);

impl ArcWake for Unparker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark();
    }
}

/// Console "list view": one text line per row, `None` while dirty.
#[derive(Default)]
struct PostView {
    lines: Vec<Option<String>>,
}

impl ListUpdateCallback for PostView {
    fn on_inserted(&mut self, position: usize, count: usize) {
        self.lines
            .splice(position..position, std::iter::repeat_with(|| None).take(count));
    }

    fn on_removed(&mut self, position: usize, count: usize) {
        self.lines.drain(position..position + count);
    }

    fn on_moved(&mut self, from: usize, to: usize) {
        let line = self.lines.remove(from);
        self.lines.insert(to, line);
    }

    fn on_changed(&mut self, position: usize, count: usize) {
        self.lines[position..position + count].fill(None);
    }
}

impl ListConsumer for PostView {}

impl PostView {
    /// Binds dirty rows and prints the list.
    fn render(&mut self, adapter: &PostAdapter) -> Result<(), ReconcileError> {
        let mut rebound = 0;
        for (row, line) in self.lines.iter_mut().enumerate() {
            if line.is_none() {
                *line = Some(describe(adapter.bind_row(row)?));
                rebound += 1;
            }
        }
        println!("-- {} rows, {rebound} rebound", self.lines.len());
        for line in self.lines.iter().flatten() {
            println!("   {line}");
        }
        Ok(())
    }
}

fn describe(row: BoundRow<Post>) -> String {
    match row {
        BoundRow::Item(post) => {
            let status = match post.status {
                PostStatus::Draft => "draft",
                PostStatus::Uploading => "uploading",
                PostStatus::Published => "published",
            };
            format!("{} [{status}]", post.title)
        }
        BoundRow::Loading => "(loading...)".to_string(),
        BoundRow::EndOfList => "-- end of list --".to_string(),
    }
}

/// Drains until the adapter has no pending request.
fn settle(adapter: &mut PostAdapter, view: &mut PostView) -> Result<(), ReconcileError> {
    loop {
        adapter.drain(view)?;
        if adapter.is_idle() {
            return Ok(());
        }
        thread::park_timeout(Duration::from_millis(100));
    }
}

fn show(store: &PostStore, adapter: &mut PostAdapter) {
    adapter.submit(Some(Arc::new(store.snapshot())));
}

/// Serves fetch and load-more requests made while rendering.
fn serve_requests(store: &mut PostStore, adapter: &PostAdapter) -> bool {
    let Some(displayed) = adapter.scheduler().displayed() else {
        return false;
    };
    let requests = displayed.take_requests();
    for request in &requests {
        match *request {
            SourceRequest::Fetch(position) => store.fetch(position),
            SourceRequest::LoadMore => {
                let added = store.load_more();
                log::info!("loaded {added} more posts");
            }
        }
    }
    !requests.is_empty()
}

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "logging")]
    let _ = env_logger::try_init();

    let config = ReconcilerConfig::default();
    let executor = WorkerExecutor::from_config(&config)?;
    let mut adapter: PostAdapter =
        ListAdapter::new(&config, Arc::new(post_differ()), Arc::new(executor));
    adapter.set_waker(futures_task::waker(Arc::new(Unparker(thread::current()))));

    let mut store = PostStore::new(12, 5);
    let mut view = PostView::default();

    show(&store, &mut adapter);
    settle(&mut adapter, &mut view)?;
    view.render(&adapter)?;

    // Rendering asked for missing bodies and the next page
    while serve_requests(&mut store, &adapter) {
        show(&store, &mut adapter);
        settle(&mut adapter, &mut view)?;
        view.render(&adapter)?;
    }

    // A burst of edits, each submitted before the previous diff is applied.
    // Only the last one reaches the view.
    let draft = store.add_draft("Weekend plans");
    show(&store, &mut adapter);
    store.start_upload(draft);
    show(&store, &mut adapter);
    store.rename(3, "Post #2 (edited)");
    show(&store, &mut adapter);
    store.pin(5);
    show(&store, &mut adapter);
    store.finish_upload(draft, 5000);
    store.trash(2);
    let latest = adapter.submit(Some(Arc::new(store.snapshot())));
    log::info!("burst ended with request {latest}");

    settle(&mut adapter, &mut view)?;
    view.render(&adapter)?;

    let marked = adapter.refresh_matching(&mut view, |post| post.status == PostStatus::Published);
    log::info!("refreshed {marked} published rows");
    view.render(&adapter)?;

    Ok(())
}
