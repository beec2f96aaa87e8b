pub mod repo;
pub mod tracks;

pub use repo::{InventoryRepo, ProgressionRepo};
pub use tracks::{ProgressAward, ProgressEntry, ProgressTrack, PROGRESS_PER_RANK};
