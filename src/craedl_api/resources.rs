use crate::craedl_api::client::CraedlClient;
use crate::craedl_api::types::{ApiError, CraedlError};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Profile payload returned by the API
///
/// Fields the client does not model end up in `extra` so nothing from the
/// wire is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Project payload returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub id: u64,
    pub name: String,
    /// Id of the project's home directory
    #[serde(default)]
    pub root: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Directory payloads arrive wrapped in a `directory` envelope
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DirectoryEnvelope {
    pub directory: DirectoryData,
}

/// Directory payload returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryData {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub children: Vec<ChildEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single child listed inside a directory payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Kind marker carried by directory children
///
/// The API uses `"d"` for directories; anything else is a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "d")]
    Directory,
    #[serde(rename = "f")]
    #[serde(other)]
    File,
}

/// File payload returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub parent: Option<u64>,
    /// Current version id of the file's data
    #[serde(default)]
    pub vid: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Publication payload returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationData {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<ProfileData>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Research group payload returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchGroupData {
    /// Primary key, required when creating projects under the group
    #[serde(default)]
    pub pk: Option<u64>,
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CreateDirectoryRequest {
    name: String,
    parent: u64,
}

#[derive(Debug, Serialize)]
struct CreateFileRequest {
    name: String,
    parent: u64,
    size: u64,
}

/// `research_group` is `""` for profile-owned projects and a numeric pk
/// for group-owned ones, hence the loose value type.
#[derive(Debug, Serialize)]
struct CreateProjectRequest {
    name: String,
    research_group: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct FileTicket {
    id: u64,
    vid: u64,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct SlugRef {
    slug: String,
}

/// Either side of a directory child, as returned by [`Directory::get`]
#[derive(Debug, Clone)]
pub enum Entry {
    Directory(Directory),
    File(File),
}

impl Entry {
    pub fn into_directory(self) -> Option<Directory> {
        match self {
            Entry::Directory(d) => Some(d),
            Entry::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Entry::File(f) => Some(f),
            Entry::Directory(_) => None,
        }
    }
}

/// The API hides dot-prefixed entries, so `.name` is stored as `_name`.
fn sanitize_name(name: &str) -> String {
    match name.strip_prefix('.') {
        Some(rest) => format!("_{}", rest),
        None => name.to_string(),
    }
}

/// Split a path into its components, dropping empty and `.` segments
fn normalize_path(path: &str) -> (bool, Vec<&str>) {
    let absolute = path.starts_with('/');
    let components = path
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    (absolute, components)
}

fn local_file_name(path: &Path) -> Result<String, CraedlError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| CraedlError::Config(format!("cannot derive a file name from {:?}", path)))
}

/// The authenticated-user handle returned by [`crate::auth`]
///
/// Every other domain object is reached from here.
#[derive(Debug, Clone)]
pub struct Profile {
    client: CraedlClient,
    data: ProfileData,
}

impl Profile {
    /// Look up the identity behind the client's token (`profile/whoami/`)
    pub async fn whoami(client: &CraedlClient) -> Result<Self, CraedlError> {
        let data = client.get("profile/whoami/").await?;
        Ok(Self {
            client: client.clone(),
            data,
        })
    }

    /// Fetch a profile by id
    pub async fn fetch(client: &CraedlClient, id: u64) -> Result<Self, CraedlError> {
        let data = client.get(&format!("profile/{}/", id)).await?;
        Ok(Self {
            client: client.clone(),
            data,
        })
    }

    fn from_data(client: &CraedlClient, data: ProfileData) -> Self {
        Self {
            client: client.clone(),
            data,
        }
    }

    pub fn id(&self) -> u64 {
        self.data.id
    }

    pub fn username(&self) -> Option<&str> {
        self.data.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.data.email.as_deref()
    }

    pub fn data(&self) -> &ProfileData {
        &self.data
    }

    /// Create a new project belonging to this profile
    pub async fn create_project(&self, name: &str) -> Result<Project, CraedlError> {
        let request = CreateProjectRequest {
            name: name.to_string(),
            research_group: serde_json::Value::String(String::new()),
        };
        let created: IdRef = self.client.post("project/", &request).await?;
        Project::fetch(&self.client, created.id).await
    }

    /// Get a particular project that belongs to this profile
    pub async fn get_project(&self, name: &str) -> Result<Project, CraedlError> {
        let projects = self.get_projects().await?;
        projects
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| CraedlError::NotFound(name.to_string()))
    }

    /// Get the projects that belong to this profile
    pub async fn get_projects(&self) -> Result<Vec<Project>, CraedlError> {
        let refs: Vec<IdRef> = self
            .client
            .get(&format!("profile/{}/projects/", self.data.id))
            .await?;
        let mut projects = Vec::with_capacity(refs.len());
        for r in refs {
            projects.push(Project::fetch(&self.client, r.id).await?);
        }
        Ok(projects)
    }

    /// Get the publications that belong to this profile
    pub async fn get_publications(&self) -> Result<Vec<Publication>, CraedlError> {
        let data: Vec<PublicationData> = self
            .client
            .get(&format!("profile/{}/publications/", self.data.id))
            .await?;
        Ok(data
            .into_iter()
            .map(|d| Publication::from_data(&self.client, d))
            .collect())
    }

    /// Get a particular research group by its URL slug
    pub async fn get_research_group(&self, slug: &str) -> Result<ResearchGroup, CraedlError> {
        ResearchGroup::fetch(&self.client, slug).await
    }

    /// Get the research groups this profile belongs to
    pub async fn get_research_groups(&self) -> Result<Vec<ResearchGroup>, CraedlError> {
        let refs: Vec<SlugRef> = self.client.get("research_group/").await?;
        let mut groups = Vec::with_capacity(refs.len());
        for r in refs {
            groups.push(ResearchGroup::fetch(&self.client, &r.slug).await?);
        }
        Ok(groups)
    }
}

/// A Craedl project handle
#[derive(Debug, Clone)]
pub struct Project {
    client: CraedlClient,
    data: ProjectData,
}

impl Project {
    /// Fetch a project by id
    pub async fn fetch(client: &CraedlClient, id: u64) -> Result<Self, CraedlError> {
        let data = client.get(&format!("project/{}/", id)).await?;
        Ok(Self {
            client: client.clone(),
            data,
        })
    }

    pub fn id(&self) -> u64 {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    /// Get the data attached to this project, starting at its home directory
    pub async fn get_data(&self) -> Result<Directory, CraedlError> {
        let root = self.data.root.ok_or_else(|| {
            CraedlError::Config(format!("project '{}' has no data root", self.data.name))
        })?;
        Directory::fetch(&self.client, root).await
    }

    /// Get the publications attached to this project
    pub async fn get_publications(&self) -> Result<Vec<Publication>, CraedlError> {
        let data: Vec<PublicationData> = self
            .client
            .get(&format!("project/{}/publications/", self.data.id))
            .await?;
        Ok(data
            .into_iter()
            .map(|d| Publication::from_data(&self.client, d))
            .collect())
    }
}

/// A Craedl directory handle
///
/// Mutating operations return a refreshed handle for the same directory,
/// since creating children changes the listing:
///
/// ```no_run
/// # async fn example(home: craedl::Directory) -> Result<(), craedl::CraedlError> {
/// let home = home.create_directory("results").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Directory {
    client: CraedlClient,
    data: DirectoryData,
}

impl Directory {
    /// Fetch a directory by id
    pub async fn fetch(client: &CraedlClient, id: u64) -> Result<Self, CraedlError> {
        let envelope: DirectoryEnvelope = client.get(&format!("directory/{}/", id)).await?;
        Ok(Self {
            client: client.clone(),
            data: envelope.directory,
        })
    }

    pub fn id(&self) -> u64 {
        self.data.id
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn children(&self) -> &[ChildEntry] {
        &self.data.children
    }

    pub fn data(&self) -> &DirectoryData {
        &self.data
    }

    /// Re-fetch this directory to pick up listing changes
    pub async fn refresh(&self) -> Result<Self, CraedlError> {
        Self::fetch(&self.client, self.data.id).await
    }

    /// Create a new directory contained within this one
    ///
    /// Returns the refreshed instance of this directory (it has a new
    /// child); use [`Directory::get`] to obtain the new directory itself.
    pub async fn create_directory(&self, name: &str) -> Result<Self, CraedlError> {
        let request = CreateDirectoryRequest {
            name: name.to_string(),
            parent: self.data.id,
        };
        let _: serde_json::Value = self.client.post("directory/", &request).await?;
        self.refresh().await
    }

    /// Get the named child directory, creating it first if necessary
    pub async fn ensure_directory(&self, name: &str) -> Result<Self, CraedlError> {
        let existing = self
            .data
            .children
            .iter()
            .find(|c| c.kind == EntryKind::Directory && c.name == name)
            .map(|c| c.id);
        if let Some(id) = existing {
            return Self::fetch(&self.client, id).await;
        }

        let refreshed = self.create_directory(name).await?;
        let child = refreshed
            .data
            .children
            .iter()
            .find(|c| c.kind == EntryKind::Directory && c.name == name)
            .ok_or_else(|| CraedlError::NotFound(name.to_string()))?;
        Self::fetch(&self.client, child.id).await
    }

    /// Upload a local file (or, recursively, a local directory) into this
    /// directory
    ///
    /// Returns the refreshed instance of this directory; use
    /// [`Directory::get`] to obtain the new entry. When uploading a tree,
    /// dot-prefixed directory names are rewritten (`.x` becomes `_x`).
    pub async fn create_file(&self, local_path: impl AsRef<Path>) -> Result<Self, CraedlError> {
        let local = local_path.as_ref();
        let metadata = tokio::fs::metadata(local).await?;

        if metadata.is_dir() {
            self.upload_tree(local).await?;
        } else {
            self.upload_file(local).await?;
        }

        self.refresh().await
    }

    async fn upload_tree(&self, dir: &Path) -> Result<(), CraedlError> {
        let name = sanitize_name(&local_file_name(dir)?);
        tracing::debug!("Uploading directory {:?} as '{}'", dir, name);
        let target = self.ensure_directory(&name).await?;

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                Box::pin(target.upload_tree(&path)).await?;
            } else {
                target.upload_file(&path).await?;
            }
        }
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> Result<(), CraedlError> {
        let name = local_file_name(path)?;
        let size = tokio::fs::metadata(path).await?.len();

        tracing::debug!(
            "Uploading file {:?} ({} bytes) into directory {}",
            path,
            size,
            self.data.id
        );

        let request = CreateFileRequest {
            name,
            parent: self.data.id,
            size,
        };
        let ticket: FileTicket = self.client.post("file/", &request).await?;

        self.client
            .put_data(&format!("data/{}/?vid={}", ticket.id, ticket.vid), path)
            .await?;
        Ok(())
    }

    /// Get a particular directory or file by path
    ///
    /// Accepts relative paths, `.` and `..` segments, and absolute paths.
    /// An absolute path is resolved from the topmost directory reachable
    /// from here and must begin with that directory's name.
    pub async fn get(&self, path: &str) -> Result<Entry, CraedlError> {
        let (absolute, mut components) = normalize_path(path);

        let mut dir = if absolute {
            let top = self.top().await?;
            // An absolute path starts with the top directory's own name.
            if let Some(first) = components.first() {
                if top.name() != Some(*first) {
                    return Err(CraedlError::NotFound(first.to_string()));
                }
                components.remove(0);
            }
            top
        } else {
            self.clone()
        };

        let mut i = 0;
        while i < components.len() {
            let component = components[i];
            let last = i + 1 == components.len();

            if component == ".." {
                let parent = dir
                    .data
                    .parent
                    .ok_or_else(|| CraedlError::NotFound("..".to_string()))?;
                dir = Self::fetch(&self.client, parent).await?;
                i += 1;
                continue;
            }

            let child = dir
                .data
                .children
                .iter()
                .find(|c| c.name == component)
                .ok_or_else(|| CraedlError::NotFound(component.to_string()))?;

            match child.kind {
                EntryKind::Directory => {
                    let next = Self::fetch(&self.client, child.id).await?;
                    if last {
                        return Ok(Entry::Directory(next));
                    }
                    dir = next;
                }
                EntryKind::File => {
                    if !last {
                        // Cannot descend into a file.
                        return Err(CraedlError::NotFound(component.to_string()));
                    }
                    return Ok(Entry::File(File::fetch(&self.client, child.id).await?));
                }
            }
            i += 1;
        }

        Ok(Entry::Directory(dir))
    }

    /// Climb to the topmost directory reachable from this one
    async fn top(&self) -> Result<Self, CraedlError> {
        let mut dir = self.clone();
        while let Some(parent) = dir.data.parent {
            match Self::fetch(&self.client, parent).await {
                Ok(d) => dir = d,
                // The parent of a project home directory is not visible.
                Err(CraedlError::NotFound(_)) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(dir)
    }

    /// List the contents of this directory
    pub async fn list(&self) -> Result<(Vec<Directory>, Vec<File>), CraedlError> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for child in &self.data.children {
            match child.kind {
                EntryKind::Directory => dirs.push(Self::fetch(&self.client, child.id).await?),
                EntryKind::File => files.push(File::fetch(&self.client, child.id).await?),
            }
        }
        Ok((dirs, files))
    }
}

/// A Craedl file handle
#[derive(Debug, Clone)]
pub struct File {
    client: CraedlClient,
    data: FileData,
}

impl File {
    /// Fetch a file by id
    pub async fn fetch(client: &CraedlClient, id: u64) -> Result<Self, CraedlError> {
        let data = client.get(&format!("file/{}/", id)).await?;
        Ok(Self {
            client: client.clone(),
            data,
        })
    }

    pub fn id(&self) -> u64 {
        self.data.id
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.data.size
    }

    pub fn data(&self) -> &FileData {
        &self.data
    }

    /// Download this file's data
    ///
    /// `dest` may be a file path or an existing directory (the file's own
    /// name is used inside it). `version` selects a specific data version;
    /// `None` downloads the current one. Returns the path written.
    pub async fn download(
        &self,
        dest: impl AsRef<Path>,
        version: Option<u64>,
    ) -> Result<PathBuf, CraedlError> {
        let path = match version {
            Some(v) => format!("data/{}/?vid={}", self.data.id, v),
            None => format!("data/{}/", self.data.id),
        };
        let response = self.client.get_data(&path).await?;

        let dest = dest.as_ref();
        let target = if dest.is_dir() {
            let name = self.data.name.as_deref().ok_or_else(|| {
                CraedlError::Config(format!("file {} has no name to save under", self.data.id))
            })?;
            dest.join(name)
        } else {
            dest.to_path_buf()
        };

        tracing::debug!("Downloading file {} to {:?}", self.data.id, target);

        let mut out = tokio::fs::File::create(&target).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(ApiError::from)?;
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        Ok(target)
    }
}

/// A Craedl publication handle
#[derive(Debug, Clone)]
pub struct Publication {
    client: CraedlClient,
    data: PublicationData,
}

impl Publication {
    /// Fetch a publication by id
    pub async fn fetch(client: &CraedlClient, id: u64) -> Result<Self, CraedlError> {
        let data = client.get(&format!("publication/{}/", id)).await?;
        Ok(Self {
            client: client.clone(),
            data,
        })
    }

    pub(crate) fn from_data(client: &CraedlClient, data: PublicationData) -> Self {
        Self {
            client: client.clone(),
            data,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.data.title.as_deref()
    }

    pub fn data(&self) -> &PublicationData {
        &self.data
    }

    /// The authors of this publication, as profile handles
    pub fn authors(&self) -> Vec<Profile> {
        self.data
            .authors
            .iter()
            .map(|a| Profile::from_data(&self.client, a.clone()))
            .collect()
    }
}

/// A Craedl research group handle
#[derive(Debug, Clone)]
pub struct ResearchGroup {
    client: CraedlClient,
    data: ResearchGroupData,
}

impl ResearchGroup {
    /// Fetch a research group by its URL slug
    pub async fn fetch(client: &CraedlClient, slug: &str) -> Result<Self, CraedlError> {
        let data = client.get(&format!("research_group/{}/", slug)).await?;
        Ok(Self {
            client: client.clone(),
            data,
        })
    }

    pub fn slug(&self) -> &str {
        &self.data.slug
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn data(&self) -> &ResearchGroupData {
        &self.data
    }

    /// Create a new project belonging to this research group
    pub async fn create_project(&self, name: &str) -> Result<Project, CraedlError> {
        let pk = self.data.pk.ok_or_else(|| {
            CraedlError::Config(format!("research group '{}' has no pk", self.data.slug))
        })?;
        let request = CreateProjectRequest {
            name: name.to_string(),
            research_group: serde_json::Value::from(pk),
        };
        let created: IdRef = self.client.post("project/", &request).await?;
        Project::fetch(&self.client, created.id).await
    }

    /// Get a particular project that belongs to this research group
    pub async fn get_project(&self, name: &str) -> Result<Project, CraedlError> {
        let projects = self.get_projects().await?;
        projects
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| CraedlError::NotFound(name.to_string()))
    }

    /// Get the projects that belong to this research group
    pub async fn get_projects(&self) -> Result<Vec<Project>, CraedlError> {
        let refs: Vec<IdRef> = self
            .client
            .get(&format!("research_group/{}/projects/", self.data.slug))
            .await?;
        let mut projects = Vec::with_capacity(refs.len());
        for r in refs {
            projects.push(Project::fetch(&self.client, r.id).await?);
        }
        Ok(projects)
    }

    /// Get the publications that belong to this research group
    pub async fn get_publications(&self) -> Result<Vec<Publication>, CraedlError> {
        let data: Vec<PublicationData> = self
            .client
            .get(&format!("research_group/{}/publications/", self.data.slug))
            .await?;
        Ok(data
            .into_iter()
            .map(|d| Publication::from_data(&self.client, d))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rewrites_leading_dot() {
        assert_eq!(sanitize_name(".config"), "_config");
        assert_eq!(sanitize_name("data"), "data");
        assert_eq!(sanitize_name("."), "_");
    }

    #[test]
    fn normalize_drops_empty_and_dot_segments() {
        let (absolute, comps) = normalize_path("./a//b/./c");
        assert!(!absolute);
        assert_eq!(comps, vec!["a", "b", "c"]);

        let (absolute, comps) = normalize_path("/top/data");
        assert!(absolute);
        assert_eq!(comps, vec!["top", "data"]);

        let (absolute, comps) = normalize_path(".");
        assert!(!absolute);
        assert!(comps.is_empty());
    }

    #[test]
    fn normalize_keeps_parent_segments() {
        let (_, comps) = normalize_path("../x");
        assert_eq!(comps, vec!["..", "x"]);
    }

    #[test]
    fn entry_kind_parses_d_and_f() {
        let d: EntryKind = serde_json::from_str("\"d\"").unwrap();
        let f: EntryKind = serde_json::from_str("\"f\"").unwrap();
        assert_eq!(d, EntryKind::Directory);
        assert_eq!(f, EntryKind::File);
    }

    #[test]
    fn entry_kind_unknown_counts_as_file() {
        let k: EntryKind = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(k, EntryKind::File);
    }

    #[test]
    fn directory_envelope_deserializes() {
        let json = r#"{
            "directory": {
                "id": 42,
                "name": "home",
                "parent": null,
                "children": [
                    {"id": 1, "name": "results", "type": "d"},
                    {"id": 2, "name": "notes.txt", "type": "f"}
                ],
                "owner": 7
            }
        }"#;
        let envelope: DirectoryEnvelope = serde_json::from_str(json).unwrap();
        let dir = envelope.directory;
        assert_eq!(dir.id, 42);
        assert_eq!(dir.name.as_deref(), Some("home"));
        assert_eq!(dir.children.len(), 2);
        assert_eq!(dir.children[0].kind, EntryKind::Directory);
        assert_eq!(dir.children[1].kind, EntryKind::File);
        assert_eq!(dir.extra["owner"], serde_json::json!(7));
    }

    #[test]
    fn profile_data_keeps_unmodeled_fields() {
        let json = r#"{"id": 9, "username": "ada", "orcid": "0000-0001"}"#;
        let data: ProfileData = serde_json::from_str(json).unwrap();
        assert_eq!(data.id, 9);
        assert_eq!(data.username.as_deref(), Some("ada"));
        assert_eq!(data.extra["orcid"], serde_json::json!("0000-0001"));
    }

    #[test]
    fn create_project_request_for_profile_sends_empty_group() {
        let request = CreateProjectRequest {
            name: "simulations".to_string(),
            research_group: serde_json::Value::String(String::new()),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"research_group\":\"\""));
    }

    #[test]
    fn create_project_request_for_group_sends_pk() {
        let request = CreateProjectRequest {
            name: "simulations".to_string(),
            research_group: serde_json::Value::from(12u64),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"research_group\":12"));
    }
}
