//! Workspace build orchestration
//!
//! [`WorkspaceBuilder`] clears the diagnostics of every real project, runs
//! the build engine and reduces the error markers left behind to a
//! [`BuildStatus`].

use std::sync::Arc;

use lsp_types::{Diagnostic, Url};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};

use crate::cancel::CancellationToken;
use crate::error::BuildError;
use crate::marker::DiagnosticMarker;

/// Outcome of one workspace build request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Failed,
    Succeed,
    WithError,
    Cancelled,
}

impl BuildStatus {
    /// Integer sent to the client
    pub fn code(self) -> u8 {
        match self {
            BuildStatus::Failed => 0,
            BuildStatus::Succeed => 1,
            BuildStatus::WithError => 2,
            BuildStatus::Cancelled => 3,
        }
    }
}

impl Serialize for BuildStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Kind of build requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Clean,
    Full,
    Incremental,
}

/// A project known to the workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
    pub name: String,
    pub uri: Url,
}

impl ProjectRef {
    pub fn new(name: impl Into<String>, uri: Url) -> Self {
        Self {
            name: name.into(),
            uri,
        }
    }
}

/// Notifications sent back to the editor
pub trait ClientConnection: Send + Sync {
    fn publish_diagnostics(&self, uri: &Url, diagnostics: Vec<Diagnostic>);
}

/// Project enumeration and marker queries
pub trait ProjectRegistry: Send + Sync {
    /// The synthetic project holding resources outside every real project
    fn default_project(&self) -> ProjectRef;

    fn projects(&self) -> Vec<ProjectRef>;

    /// Drop stale state attached to `project`
    fn cleanup_resources(&self, project: &ProjectRef) -> Result<(), BuildError>;

    /// Problem markers currently attached to `project`, of any severity
    fn markers(&self, project: &ProjectRef) -> Vec<DiagnosticMarker>;
}

/// The incremental builder that produces markers
pub trait BuildEngine: Send + Sync {
    fn build(&self, mode: BuildMode, token: &CancellationToken) -> Result<(), BuildError>;
}

/// Runs workspace builds on behalf of client requests
pub struct WorkspaceBuilder {
    connection: Arc<dyn ClientConnection>,
    registry: Arc<dyn ProjectRegistry>,
    engine: Arc<dyn BuildEngine>,
    /// Serializes builds of this workspace
    build_lock: Mutex<()>,
}

impl WorkspaceBuilder {
    pub fn new(
        connection: Arc<dyn ClientConnection>,
        registry: Arc<dyn ProjectRegistry>,
        engine: Arc<dyn BuildEngine>,
    ) -> Self {
        Self {
            connection,
            registry,
            engine,
            build_lock: Mutex::new(()),
        }
    }

    /// Build the workspace and report the aggregate status.
    ///
    /// A second caller blocks until the running build has finished.
    pub fn build_workspace(&self, force_rebuild: bool, token: &CancellationToken) -> BuildStatus {
        let _guard = self.build_lock.lock();

        match self.run_build(force_rebuild, token) {
            Ok(status) => status,
            Err(BuildError::Cancelled) => {
                log::info!("Workspace build cancelled");
                BuildStatus::Cancelled
            }
            Err(err) => {
                log::error!("Failed to build workspace: {}", err);
                BuildStatus::Failed
            }
        }
    }

    fn run_build(
        &self,
        force_rebuild: bool,
        token: &CancellationToken,
    ) -> Result<BuildStatus, BuildError> {
        if token.is_cancelled() {
            return Ok(BuildStatus::Cancelled);
        }

        let default_project = self.registry.default_project();
        self.registry.cleanup_resources(&default_project)?;

        let projects: Vec<ProjectRef> = self
            .registry
            .projects()
            .into_iter()
            .filter(|project| *project != default_project)
            .collect();
        for project in &projects {
            self.connection.publish_diagnostics(&project.uri, Vec::new());
        }

        if force_rebuild {
            self.engine.build(BuildMode::Clean, token)?;
            self.engine.build(BuildMode::Full, token)?;
        } else {
            self.engine.build(BuildMode::Incremental, token)?;
        }

        let errors: Vec<String> = projects
            .iter()
            .flat_map(|project| self.registry.markers(project))
            .filter(DiagnosticMarker::is_error)
            .map(|marker| marker.to_string())
            .collect();

        if errors.is_empty() {
            return Ok(BuildStatus::Succeed);
        }

        // Markers of the default project never reach the client, so the
        // details only surface in the server log.
        log::error!(
            "Error occurred while building workspace. Details:\n{}",
            errors.join("\n")
        );
        Ok(BuildStatus::WithError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(BuildStatus::Failed.code(), 0);
        assert_eq!(BuildStatus::Succeed.code(), 1);
        assert_eq!(BuildStatus::WithError.code(), 2);
        assert_eq!(BuildStatus::Cancelled.code(), 3);
    }

    #[test]
    fn test_status_serializes_as_integer() {
        let json = serde_json::to_string(&BuildStatus::WithError).unwrap();
        assert_eq!(json, "2");
    }
}
