//! Output sink for fully-priced pairs

use crate::domain::PairRecord;

#[cfg_attr(test, mockall::automock)]
pub trait PairSink: Send + Sync {
    /// Render one batch of priced pairs. Side effects only.
    fn display(&self, pairs: &[PairRecord]);
}
