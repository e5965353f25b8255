pub mod auth;
pub mod grid;
pub mod map;
pub mod report;
pub mod roster;
pub mod tracker;
pub mod weight;
pub mod weight_log;

pub use crate::domain::model::{CardCounts, Position, Role, Student, StudentId, WeightEntry};
pub use crate::domain::ports::{Celebration, Storage, SyncBackend};
pub use crate::utils::error::Result;
