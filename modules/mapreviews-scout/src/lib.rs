pub mod augmenter;
pub mod channel;
pub mod page_scraper;
pub mod page_source;
pub mod registry;
pub mod review_fetcher;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod viewport;

pub use augmenter::{Augmenter, CycleStats};
pub use channel::{spawn_review_worker, ChannelError, ReviewHandle};
pub use review_fetcher::{ReviewFetcher, ReviewSource};
