use std::sync::Arc;

use kestrel_lsp_core::{CancellationToken, SignatureHelpResolver};
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;

use super::CancelOnDrop;

/// Get signature help for a position in the document
pub async fn get_signature_help(
    resolver: Arc<SignatureHelpResolver>,
    uri: Url,
    position: Position,
) -> Result<Option<SignatureHelp>> {
    let token = CancellationToken::new();
    let _guard = CancelOnDrop(token.clone());

    let help = tokio::task::spawn_blocking(move || resolver.resolve(&uri, position, &token))
        .await
        .map_err(|err| {
            log::error!("Signature help task failed: {}", err);
            Error::internal_error()
        })?;

    if help.signatures.is_empty() {
        Ok(None)
    } else {
        Ok(Some(help))
    }
}
