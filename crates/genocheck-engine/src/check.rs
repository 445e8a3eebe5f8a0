//! The check capability

use crate::context::CheckContext;
use crate::error::CheckError;
use genocheck_core::CheckMetadata;

/// A named integrity check
///
/// `run` evaluates every assertion in order, records findings through the
/// context and returns the logical AND of the assertions. An `Err` means the
/// check could not verify the database at all and is reported as ERROR.
#[async_trait::async_trait]
pub trait Check: Send + Sync {
    fn metadata(&self) -> &CheckMetadata;

    async fn run(&self, ctx: &mut CheckContext) -> Result<bool, CheckError>;
}
