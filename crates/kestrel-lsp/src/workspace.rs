//! Projects, markers and the delimiter-checking build engine
//!
//! Every workspace folder is a project. Documents outside all folders, and
//! documents with non-file URIs, belong to the synthetic default project.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use kestrel_lsp_core::{
    BuildEngine, BuildError, BuildMode, CancellationToken, DiagnosticMarker, DocumentStore,
    ProjectRef, ProjectRegistry,
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tower_lsp::lsp_types::{Position, Range, Url};

use crate::document::DocumentSet;
use crate::syntax;

pub static DEFAULT_PROJECT: Lazy<ProjectRef> = Lazy::new(|| {
    ProjectRef::new(
        "default",
        Url::parse("kestrel:/default-project").expect("default project URI is valid"),
    )
});

/// A marker with the document range it applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMarker {
    pub marker: DiagnosticMarker,
    pub range: Range,
}

struct ProjectRoot {
    project: ProjectRef,
    path: PathBuf,
}

fn project_root((name, uri): (String, Url)) -> Option<ProjectRoot> {
    match uri.to_file_path() {
        Ok(path) => Some(ProjectRoot {
            project: ProjectRef::new(name, uri),
            path,
        }),
        Err(()) => {
            log::warn!("Ignoring non-file workspace folder {}", uri);
            None
        }
    }
}

pub struct Workspace {
    documents: Arc<DocumentSet>,
    roots: RwLock<Vec<ProjectRoot>>,
    markers: DashMap<Url, Vec<ResourceMarker>>,
}

impl Workspace {
    pub fn new(documents: Arc<DocumentSet>) -> Self {
        Self {
            documents,
            roots: RwLock::new(Vec::new()),
            markers: DashMap::new(),
        }
    }

    /// Replace the project list with one project per folder
    pub fn set_folders(&self, folders: Vec<(String, Url)>) {
        let roots = folders.into_iter().filter_map(project_root).collect();
        *self.roots.write() = roots;
    }

    pub fn change_folders(&self, added: Vec<(String, Url)>, removed: &[Url]) {
        let mut roots = self.roots.write();
        roots.retain(|root| !removed.contains(&root.project.uri));
        roots.extend(added.into_iter().filter_map(project_root));
    }

    /// The project owning `uri`: the folder with the longest matching path
    pub fn project_of(&self, uri: &Url) -> ProjectRef {
        let Ok(path) = uri.to_file_path() else {
            return DEFAULT_PROJECT.clone();
        };
        self.roots
            .read()
            .iter()
            .filter(|root| path.starts_with(&root.path))
            .max_by_key(|root| root.path.components().count())
            .map(|root| root.project.clone())
            .unwrap_or_else(|| DEFAULT_PROJECT.clone())
    }

    /// Markers of every open document outside the default project, including
    /// documents that currently have none.
    pub fn publishable_markers(&self) -> Vec<(Url, i32, Vec<ResourceMarker>)> {
        self.documents
            .uris()
            .into_iter()
            .filter(|uri| self.project_of(uri) != *DEFAULT_PROJECT)
            .filter_map(|uri| {
                let (_, version) = self.documents.snapshot(&uri)?;
                let markers = self
                    .markers
                    .get(&uri)
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default();
                Some((uri, version, markers))
            })
            .collect()
    }

    /// Close a document and forget its markers
    pub fn close_document(&self, uri: &Url) {
        self.documents.close(uri);
        self.markers.remove(uri);
    }

    fn check(&self, uri: &Url) {
        let Some((text, version)) = self.documents.snapshot(uri) else {
            self.markers.remove(uri);
            return;
        };

        let resource = uri.to_file_path().ok();
        let encoding = self.documents.position_encoding();
        let markers: Vec<ResourceMarker> = syntax::parse(&text)
            .problems()
            .iter()
            .map(|problem| {
                let (line, character) = text.position_at_encoded(problem.offset(), encoding);
                let mut marker = DiagnosticMarker::error(problem.message())
                    .with_code(problem.code())
                    .with_line(line + 1);
                if let Some(resource) = &resource {
                    marker = marker.with_resource(resource.clone());
                }
                ResourceMarker {
                    marker,
                    range: Range {
                        start: Position { line, character },
                        end: Position {
                            line,
                            character: character + 1,
                        },
                    },
                }
            })
            .collect();

        log::debug!("Checked {}: {} problems", uri, markers.len());
        if markers.is_empty() {
            self.markers.remove(uri);
        } else {
            self.markers.insert(uri.clone(), markers);
        }
        self.documents.mark_clean(uri, version);
    }
}

impl ProjectRegistry for Workspace {
    fn default_project(&self) -> ProjectRef {
        DEFAULT_PROJECT.clone()
    }

    fn projects(&self) -> Vec<ProjectRef> {
        let mut projects = vec![DEFAULT_PROJECT.clone()];
        projects.extend(self.roots.read().iter().map(|root| root.project.clone()));
        projects
    }

    /// Forget markers of closed documents belonging to `project`
    fn cleanup_resources(&self, project: &ProjectRef) -> Result<(), BuildError> {
        self.markers
            .retain(|uri, _| self.documents.contains(uri) || self.project_of(uri) != *project);
        Ok(())
    }

    fn markers(&self, project: &ProjectRef) -> Vec<DiagnosticMarker> {
        let mut entries: Vec<(Url, Vec<ResourceMarker>)> = self
            .markers
            .iter()
            .filter(|entry| self.project_of(entry.key()) == *project)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
            .into_iter()
            .flat_map(|(_, markers)| markers)
            .map(|resource| resource.marker)
            .collect()
    }
}

impl BuildEngine for Workspace {
    fn build(&self, mode: BuildMode, token: &CancellationToken) -> Result<(), BuildError> {
        let uris = match mode {
            BuildMode::Clean => {
                self.markers.clear();
                self.documents.mark_all_dirty();
                return Ok(());
            }
            BuildMode::Full => self.documents.uris(),
            BuildMode::Incremental => self.documents.dirty_uris(),
        };

        // closed documents can no longer be checked
        self.markers.retain(|uri, _| self.documents.contains(uri));

        log::debug!("{:?} build of {} documents", mode, uris.len());
        for uri in &uris {
            if token.is_cancelled() {
                return Err(BuildError::Cancelled);
            }
            self.check(uri);
        }
        Ok(())
    }
}
