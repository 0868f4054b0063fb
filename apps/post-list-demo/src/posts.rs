//! Fake post backend for the demo.

use relist::{FnDiffer, LoadMoreStrategy, PagedList};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostStatus {
    Draft,
    Uploading,
    Published,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub local_id: u32,
    /// Assigned once the post reaches the server.
    pub remote_id: Option<u64>,
    pub title: String,
    pub status: PostStatus,
}

/// Same remote id, or same local id while either side has none.
fn same_post(old: &Post, new: &Post) -> bool {
    match (old.remote_id, new.remote_id) {
        (Some(old_id), Some(new_id)) => old_id == new_id,
        _ => old.local_id == new.local_id,
    }
}

pub type PostDiffer = FnDiffer<fn(&Post, &Post) -> bool, fn(&Post, &Post) -> bool>;

pub fn post_differ() -> PostDiffer {
    FnDiffer::new(
        same_post as fn(&Post, &Post) -> bool,
        <Post as PartialEq>::eq as fn(&Post, &Post) -> bool,
    )
}

/// Server-side list plus which entries the client has loaded.
pub struct PostStore {
    posts: Vec<Post>,
    loaded: Vec<bool>,
    total_on_server: usize,
    page_size: usize,
    next_local_id: u32,
}

impl PostStore {
    pub fn new(total_on_server: usize, page_size: usize) -> Self {
        let mut store = Self {
            posts: Vec::new(),
            loaded: Vec::new(),
            total_on_server,
            page_size,
            next_local_id: 1,
        };
        store.load_more();
        store
    }

    /// Immutable snapshot for the adapter.
    pub fn snapshot(&self) -> PagedList<Post> {
        let slots = self
            .posts
            .iter()
            .zip(&self.loaded)
            .map(|(post, loaded)| loaded.then(|| post.clone()))
            .collect();
        let stable_ids = self.posts.iter().map(|post| post.remote_id).collect();
        PagedList::new(slots)
            .with_stable_ids(stable_ids)
            .with_has_more(self.remote_count() < self.total_on_server)
            .with_load_more_strategy(LoadMoreStrategy::new(3))
    }

    fn remote_count(&self) -> usize {
        self.posts.iter().filter(|post| post.remote_id.is_some()).count()
    }

    /// Appends the next page; every third post arrives without its body.
    pub fn load_more(&mut self) -> usize {
        let start = self.remote_count();
        let end = (start + self.page_size).min(self.total_on_server);
        for index in start..end {
            let local_id = self.allocate_local_id();
            self.posts.push(Post {
                local_id,
                remote_id: Some(1000 + index as u64),
                title: format!("Post #{index}"),
                status: PostStatus::Published,
            });
            self.loaded.push(index % 3 != 2);
        }
        end - start
    }

    pub fn fetch(&mut self, position: usize) {
        if let Some(loaded) = self.loaded.get_mut(position) {
            *loaded = true;
        }
    }

    /// Adds a local draft at the top and returns its local id.
    pub fn add_draft(&mut self, title: &str) -> u32 {
        let local_id = self.allocate_local_id();
        self.posts.insert(
            0,
            Post {
                local_id,
                remote_id: None,
                title: title.to_string(),
                status: PostStatus::Draft,
            },
        );
        self.loaded.insert(0, true);
        local_id
    }

    pub fn start_upload(&mut self, local_id: u32) {
        if let Some(post) = self.find_mut(local_id) {
            post.status = PostStatus::Uploading;
        }
    }

    /// The server accepted the draft: it gains a remote id.
    pub fn finish_upload(&mut self, local_id: u32, remote_id: u64) {
        if let Some(post) = self.find_mut(local_id) {
            post.remote_id = Some(remote_id);
            post.status = PostStatus::Published;
        }
        self.total_on_server += 1;
    }

    pub fn rename(&mut self, position: usize, title: &str) {
        if let Some(post) = self.posts.get_mut(position) {
            post.title = title.to_string();
        }
    }

    /// Moves the post at `from` to the top, like pinning it.
    pub fn pin(&mut self, from: usize) {
        if from < self.posts.len() {
            let post = self.posts.remove(from);
            let loaded = self.loaded.remove(from);
            self.posts.insert(0, post);
            self.loaded.insert(0, loaded);
        }
    }

    pub fn trash(&mut self, position: usize) {
        if position < self.posts.len() {
            self.posts.remove(position);
            self.loaded.remove(position);
            self.total_on_server = self.total_on_server.saturating_sub(1);
        }
    }

    fn find_mut(&mut self, local_id: u32) -> Option<&mut Post> {
        self.posts.iter_mut().find(|post| post.local_id == local_id)
    }

    fn allocate_local_id(&mut self) -> u32 {
        let id = self.next_local_id;
        self.next_local_id += 1;
        id
    }
}
