//! Test helpers for ingest tests
//!
//! In-memory storage and video repository plus scripted prober/remuxer, so
//! the pipeline can be exercised without S3, PostgreSQL or ffmpeg.

pub mod fakes;
pub mod fixtures;
pub mod mock_repositories;
pub mod mock_storage;

pub use fakes::{FakeProber, FakeRemuxer};
pub use mock_repositories::MockVideoRepository;
pub use mock_storage::{MockObject, MockStorage};
