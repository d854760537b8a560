use crate::error::Result;
use crate::git::Git;

/// Stage everything and commit if the index differs from HEAD.
///
/// Returns `false` when there was nothing to commit.
pub async fn commit_pending(git: &Git, message: &str) -> Result<bool> {
    git.add_all().await?;

    if !git.has_staged_changes().await? {
        tracing::info!("No changes to commit");
        return Ok(false);
    }

    git.commit(message).await?;
    tracing::info!("Committed pending changes: {}", message);
    Ok(true)
}
