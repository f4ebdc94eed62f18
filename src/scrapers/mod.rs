pub mod browser;
pub mod document;
pub mod fetch;
pub mod recency;
pub mod rent591;
pub mod traits;
pub mod types;
pub mod urls;

pub use browser::BrowserSource;
pub use fetch::{RetryPolicy, RetryingFetcher};
pub use rent591::ListingExtractor;
pub use traits::{PageFetcher, PageSource};
