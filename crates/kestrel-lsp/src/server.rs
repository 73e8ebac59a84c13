use std::sync::Arc;

use kestrel_lsp_core::{BuildStatus, PositionEncoding, SignatureHelpResolver, WorkspaceBuilder};
use tokio::runtime::Handle;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::capabilities;
use crate::config::{Settings, SharedSettings};
use crate::document::DocumentSet;
use crate::handlers;
use crate::handlers::build::BuildWorkspaceParams;
use crate::handlers::diagnostics::ClientNotifier;
use crate::signatures::{SignatureCatalog, WorkspaceSignatures};
use crate::syntax::SyntaxTrees;
use crate::workspace::Workspace;

pub struct Backend {
    client: Client,
    debug: bool,
    settings: Arc<SharedSettings>,
    documents: Arc<DocumentSet>,
    trees: Arc<SyntaxTrees>,
    workspace: Arc<Workspace>,
    builder: Arc<WorkspaceBuilder>,
    resolver: Arc<SignatureHelpResolver>,
}

impl Backend {
    /// Must be called from within the tokio runtime
    pub fn new(client: Client, debug: bool, catalog: SignatureCatalog) -> Self {
        let settings = Arc::new(SharedSettings::default());
        let documents = Arc::new(DocumentSet::new());
        let trees = Arc::new(SyntaxTrees::new(documents.clone()));
        let workspace = Arc::new(Workspace::new(documents.clone()));

        let builder = Arc::new(WorkspaceBuilder::new(
            Arc::new(ClientNotifier::new(client.clone(), Handle::current())),
            workspace.clone(),
            workspace.clone(),
        ));
        let resolver = Arc::new(SignatureHelpResolver::new(
            settings.clone(),
            documents.clone(),
            trees.clone(),
            Arc::new(WorkspaceSignatures::new(
                catalog,
                documents.clone(),
                trees.clone(),
            )),
        ));

        Self {
            client,
            debug,
            settings,
            documents,
            trees,
            workspace,
            builder,
            resolver,
        }
    }

    async fn log_debug(&self, message: &str) {
        log::debug!("{}", message);
        if self.debug {
            self.client
                .log_message(MessageType::INFO, format!("[DEBUG] {}", message))
                .await;
        }
    }

    /// Handler of the `kestrel/buildWorkspace` request
    pub async fn build_workspace(&self, params: BuildWorkspaceParams) -> Result<BuildStatus> {
        self.log_debug(&format!(
            "Build workspace request (force rebuild: {})",
            params.force_rebuild
        ))
        .await;

        let status = handlers::build::build_workspace(self.builder.clone(), params).await?;

        if matches!(status, BuildStatus::Succeed | BuildStatus::WithError) {
            handlers::diagnostics::publish_markers(&self.client, &self.workspace).await;
        }
        self.log_debug(&format!("Build workspace finished: {:?}", status))
            .await;
        Ok(status)
    }
}

fn folder_entries(folders: Vec<WorkspaceFolder>) -> Vec<(String, Url)> {
    folders
        .into_iter()
        .map(|folder| (folder.name, folder.uri))
        .collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.log_debug("Initializing Kestrel LSP server").await;

        if let Some(options) = &params.initialization_options {
            self.settings.update(Settings::from_value(options));
        }

        let encoding = PositionEncoding::negotiate(
            params
                .capabilities
                .general
                .as_ref()
                .and_then(|general| general.position_encodings.as_deref()),
        );
        self.documents.set_position_encoding(encoding);
        self.log_debug(&format!("Position encoding: {:?}", encoding))
            .await;

        #[allow(deprecated)]
        let folders = match (params.workspace_folders, params.root_uri) {
            (Some(folders), _) => folder_entries(folders),
            (None, Some(root)) => vec![("root".to_string(), root)],
            (None, None) => Vec::new(),
        };
        self.workspace.set_folders(folders);

        Ok(InitializeResult {
            capabilities: capabilities::server_capabilities(encoding),
            server_info: Some(ServerInfo {
                name: "kestrel-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.log_debug("Server initialized successfully").await;
        self.client
            .log_message(MessageType::INFO, "Kestrel LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.log_debug("Shutting down server").await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.log_debug(&format!("Document opened: {}", uri)).await;
        self.documents
            .open(uri, &params.text_document.text, params.text_document.version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        self.log_debug(&format!("Document changed: {}", uri)).await;

        // Full sync: the last change holds the entire text
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .change(uri, &change.text, params.text_document.version);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.log_debug(&format!("Document closed: {}", uri)).await;
        self.workspace.close_document(&uri);
        self.trees.evict(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = Settings::from_value(&params.settings);
        self.log_debug(&format!("Configuration changed: {:?}", settings))
            .await;
        self.settings.update(settings);
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let removed: Vec<Url> = params
            .event
            .removed
            .into_iter()
            .map(|folder| folder.uri)
            .collect();
        self.workspace
            .change_folders(folder_entries(params.event.added), &removed);
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        self.log_debug(&format!("Signature help request at {:?}", position))
            .await;

        handlers::signature_help::get_signature_help(self.resolver.clone(), uri, position).await
    }
}
