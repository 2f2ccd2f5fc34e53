//! Database repositories for the video metadata store.
//!
//! The ingest pipeline only needs to load a video by id and replace it after
//! a successful upload; [`VideoRepository`] is that contract and
//! [`PgVideoRepository`] its PostgreSQL implementation.

pub mod repository;
pub mod video;

pub use repository::VideoRepository;
pub use video::PgVideoRepository;
