#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod cache;
pub use cache::CacheLayout;
pub use cache::DEFAULT_CACHE_ROOT;
pub use cache::ensure_dir;
pub use cache::href_basename;
pub use cache::tmp_path;

mod checksum;
pub use checksum::digest_matches;
pub use checksum::file_digest;

mod error;
pub use error::Error;

mod fetch;
pub use fetch::download;
pub use fetch::download_from_mirror;
pub use fetch::download_if_missing;
pub use fetch::is_missing;

mod mirror;
pub use mirror::MirrorList;

mod progress;
pub use progress::ProgressCallback;
pub use progress::no_progress;
