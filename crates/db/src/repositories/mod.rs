//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod locker_repo;
pub mod usage_repo;
pub mod user_repo;

pub use locker_repo::LockerRepo;
pub use usage_repo::UsageRepo;
pub use user_repo::UserRepo;
