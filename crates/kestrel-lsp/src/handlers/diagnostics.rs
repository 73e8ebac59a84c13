use kestrel_lsp_core::{ClientConnection, Severity};
use tokio::runtime::Handle;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

use crate::workspace::{ResourceMarker, Workspace};

/// Source name attached to every published diagnostic
const SOURCE: &str = "kestrel";

/// Convert a build marker to an LSP diagnostic
pub fn to_diagnostic(resource: &ResourceMarker) -> Diagnostic {
    let severity = match resource.marker.severity() {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };

    Diagnostic {
        range: resource.range,
        severity: Some(severity),
        code: Some(NumberOrString::Number(resource.marker.code())),
        source: Some(SOURCE.to_string()),
        message: resource.marker.message().to_string(),
        ..Default::default()
    }
}

/// Publish the markers of every open document outside the default project
pub async fn publish_markers(client: &Client, workspace: &Workspace) {
    for (uri, version, markers) in workspace.publishable_markers() {
        let diagnostics = markers.iter().map(to_diagnostic).collect();
        client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }
}

/// Publishes diagnostics from synchronous code running off the async runtime
pub struct ClientNotifier {
    client: Client,
    runtime: Handle,
}

impl ClientNotifier {
    pub fn new(client: Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

impl ClientConnection for ClientNotifier {
    fn publish_diagnostics(&self, uri: &Url, diagnostics: Vec<Diagnostic>) {
        let client = self.client.clone();
        let uri = uri.clone();
        self.runtime.spawn(async move {
            client.publish_diagnostics(uri, diagnostics, None).await;
        });
    }
}
