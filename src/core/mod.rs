//! # Core Module
//!
//! Fundamental concurrency primitives shared by the world store and the
//! generation workers.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//! - `WorkTracker`: Outstanding-work counter with a blocking idle wait
//!
//! ## Usage
//! ```
//! use voxel_world::core::{MtResource, WorkTracker};
//!
//! // Thread-safe resource
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//!
//! // Work accounting
//! let tracker = WorkTracker::new();
//! tracker.add(1);
//! tracker.finish();
//! tracker.wait_until_idle();
//! ```

pub mod mt_resource;
pub mod work_tracker;

pub use mt_resource::MtResource;
pub use work_tracker::WorkTracker;
