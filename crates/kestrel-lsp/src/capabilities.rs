use kestrel_lsp_core::PositionEncoding;
use tower_lsp::lsp_types::*;

/// Define the server capabilities for the Kestrel LSP
pub fn server_capabilities(encoding: PositionEncoding) -> ServerCapabilities {
    ServerCapabilities {
        position_encoding: Some(encoding.kind()),

        // Full text sync - simplest to implement
        text_document_sync: Some(TextDocumentSyncCapability::Kind(
            TextDocumentSyncKind::FULL,
        )),

        // Signature help (function parameter hints)
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            retrigger_characters: Some(vec![",".to_string()]),
            work_done_progress_options: Default::default(),
        }),

        workspace: Some(WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        }),

        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_help_triggers() {
        let capabilities = server_capabilities(PositionEncoding::Utf16);
        let options = capabilities.signature_help_provider.unwrap();
        assert_eq!(
            options.trigger_characters,
            Some(vec!["(".to_string(), ",".to_string()])
        );
    }

    #[test]
    fn test_advertises_negotiated_encoding() {
        let capabilities = server_capabilities(PositionEncoding::Utf32);
        assert_eq!(capabilities.position_encoding, Some(PositionEncodingKind::UTF32));
    }
}
