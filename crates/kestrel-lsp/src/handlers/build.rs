use std::sync::Arc;

use kestrel_lsp_core::{BuildStatus, CancellationToken, WorkspaceBuilder};
use serde::Deserialize;
use tower_lsp::jsonrpc::{Error, Result};

use super::CancelOnDrop;

/// Parameters of the `kestrel/buildWorkspace` request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildWorkspaceParams {
    #[serde(default)]
    pub force_rebuild: bool,
}

/// Run a workspace build on the blocking pool.
///
/// Dropping the returned future cancels the build.
pub async fn build_workspace(
    builder: Arc<WorkspaceBuilder>,
    params: BuildWorkspaceParams,
) -> Result<BuildStatus> {
    let token = CancellationToken::new();
    let _guard = CancelOnDrop(token.clone());

    tokio::task::spawn_blocking(move || builder.build_workspace(params.force_rebuild, &token))
        .await
        .map_err(|err| {
            log::error!("Workspace build task failed: {}", err);
            Error::internal_error()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params() {
        let params: BuildWorkspaceParams =
            serde_json::from_value(serde_json::json!({ "forceRebuild": true })).unwrap();
        assert!(params.force_rebuild);

        let params: BuildWorkspaceParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!params.force_rebuild);
    }
}
