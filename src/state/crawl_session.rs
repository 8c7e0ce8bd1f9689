use std::collections::{BTreeSet, HashSet, VecDeque};
use url::Url;

/// Mutable state of one clone invocation
///
/// Holds the FIFO of pages waiting to be crawled, the set of pages already
/// visited, and every asset URL discovered so far. A URL is never both queued
/// and visited, and enters the queue at most once per crawl.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    /// The URL the clone started from (normalized)
    root: Url,

    /// Pages waiting to be crawled, in discovery order
    queue: VecDeque<Url>,

    /// Membership index for `queue`
    queued: HashSet<String>,

    /// Pages already dequeued and visited
    visited: HashSet<String>,

    /// Deduplicated asset URLs discovered across all pages
    assets: BTreeSet<Url>,
}

impl CrawlSession {
    /// Creates a session whose queue is seeded with `root`
    pub fn new(root: Url) -> Self {
        let mut session = Self {
            root: root.clone(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            assets: BTreeSet::new(),
        };
        session.enqueue(root);
        session
    }

    /// The normalized root URL of this crawl
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Adds a page to the back of the queue
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - The URL was already visited or queued
    pub fn enqueue(&mut self, url: Url) -> bool {
        if self.is_known(&url) {
            return false;
        }
        self.queued.insert(url.as_str().to_string());
        self.queue.push_back(url);
        true
    }

    /// Removes and returns the next queued page
    pub fn next_page(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.queued.remove(url.as_str());
        Some(url)
    }

    /// Marks a page as visited
    ///
    /// Returns false when the page had already been visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Returns true when the page has been visited
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Returns true when the page is waiting in the queue
    pub fn is_queued(&self, url: &Url) -> bool {
        self.queued.contains(url.as_str())
    }

    /// Returns true when the page is either visited or queued
    pub fn is_known(&self, url: &Url) -> bool {
        self.is_visited(url) || self.is_queued(url)
    }

    /// Number of pages visited so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of pages waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Records a discovered asset URL
    ///
    /// Returns false when the asset was already known.
    pub fn register_asset(&mut self, url: Url) -> bool {
        self.assets.insert(url)
    }

    /// The assets discovered so far
    pub fn assets(&self) -> &BTreeSet<Url> {
        &self.assets
    }

    /// Hands the discovered asset set over to the download phase
    pub fn take_assets(&mut self) -> BTreeSet<Url> {
        std::mem::take(&mut self.assets)
    }
}
