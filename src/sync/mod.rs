//! Full-replace synchronization between a remote collection and a local mirror.
//!
//! # Pull (remote → local)
//!
//! fetch → sort by `order` → reset mirror → write + confirm each file →
//! stamp `metadata.txt`
//!
//! # Push (local → remote)
//!
//! list + parse mirror files → delete-all batch → insert-all batch →
//! compare remote count
//!
//! Both directions replace the whole target; nothing is diffed. Each batch
//! is atomic, but delete-then-insert as a pair is not, so a reader can see
//! an empty collection while a push is in flight. A failed run is recovered
//! by running it again.

pub mod error;
mod pull;
mod push;

pub use error::SyncError;
pub use pull::PullReport;
pub use push::PushReport;

use crate::mirror::MirrorStore;
use crate::remote::RemoteCollection;

/// Both sides of a sync, borrowed for the duration of a run.
#[derive(Debug)]
pub struct Pipeline<'a, R, M> {
    remote: &'a R,
    mirror: &'a M,
}

impl<'a, R: RemoteCollection, M: MirrorStore> Pipeline<'a, R, M> {
    pub fn new(remote: &'a R, mirror: &'a M) -> Self {
        Self { remote, mirror }
    }
}
