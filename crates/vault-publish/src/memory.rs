//! # In-Memory Git Service
//!
//! A [`GitService`] backed by process memory. Used by the workflow tests and
//! by `vault --dry-run`.
//!
//! Behaves like the hosted service where the workflow can observe it:
//!
//! - Repository names are unique per project, compared case-insensitively.
//! - Commits are listed newest first.
//! - A push whose `oldObjectId` is not the current tip is rejected with a
//!   conflict and changes nothing.
//! - A push is atomic: every change is checked against the branch and the
//!   earlier changes of the same push before anything lands. Adding an
//!   existing path, or editing or deleting a missing one, rejects it whole.
//!
//! Failures can be injected per operation with [`InMemoryGitService::fail_next`],
//! and a concurrent writer can be simulated with
//! [`InMemoryGitService::race_next_pushes`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use vault_core::{CommitId, RepositoryId, DEFAULT_BRANCH};
use vault_git_client::{
    CommitQuery, GitApiError, GitCommitRef, GitPush, GitPushResult, GitRefUpdate, GitRepository,
    GitUserDate, TeamProjectReference, VersionControlChangeType,
};

use crate::service::GitService;

const AUTHOR: &str = "report-vault";

/// Operations that can have a failure injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetRepository,
    CreateRepository,
    QueryCommits,
    Push,
}

/// Number of calls seen per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_repository: usize,
    pub create_repository: usize,
    pub query_commits: usize,
    pub push: usize,
}

#[derive(Debug)]
struct StoredRepository {
    project: String,
    repository: GitRepository,
    /// Oldest first.
    commits: Vec<GitCommitRef>,
    files: BTreeMap<String, String>,
}

impl StoredRepository {
    fn tip(&self) -> CommitId {
        self.commits
            .last()
            .map(|c| c.commit_id.clone())
            .unwrap_or_else(CommitId::null)
    }

    /// Append a commit. A `None` content deletes the path.
    fn append(&mut self, comment: &str, changed: &[(&str, Option<&str>)]) -> GitCommitRef {
        let parent = self.tip();
        let mut hasher = Sha256::new();
        hasher.update(parent.as_str().as_bytes());
        hasher.update(self.commits.len().to_le_bytes());
        hasher.update(comment.as_bytes());
        for (path, content) in changed {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(content.unwrap_or_default().as_bytes());
        }
        let hex: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();

        let stamp = GitUserDate {
            name: Some(AUTHOR.to_string()),
            email: None,
            date: Some(Utc::now()),
        };
        let commit = GitCommitRef {
            commit_id: CommitId::new(&hex[..40]).unwrap_or_else(|_| CommitId::null()),
            comment: Some(comment.to_string()),
            author: Some(stamp.clone()),
            committer: Some(stamp),
            url: None,
        };
        for (path, content) in changed {
            match content {
                Some(content) => self.files.insert((*path).to_string(), (*content).to_string()),
                None => self.files.remove(*path),
            };
        }
        self.commits.push(commit.clone());
        if self.repository.default_branch.is_none() {
            self.repository.default_branch = Some(DEFAULT_BRANCH.to_string());
        }
        commit
    }
}

#[derive(Debug, Default)]
struct State {
    repositories: Vec<StoredRepository>,
    calls: CallCounts,
    failures: HashMap<Operation, VecDeque<(u16, String)>>,
    races: usize,
    pushes: Vec<GitPush>,
    last_query: Option<CommitQuery>,
    next_push_id: u64,
}

impl State {
    fn find(&self, project: &str, name: &str) -> Option<&StoredRepository> {
        self.repositories
            .iter()
            .find(|r| r.project == project && r.repository.name.eq_ignore_ascii_case(name))
    }

    fn find_mut(&mut self, project: &str, name: &str) -> Option<&mut StoredRepository> {
        self.repositories
            .iter_mut()
            .find(|r| r.project == project && r.repository.name.eq_ignore_ascii_case(name))
    }

    fn by_id_mut(&mut self, project: &str, id: &RepositoryId) -> Option<&mut StoredRepository> {
        self.repositories
            .iter_mut()
            .find(|r| r.project == project && &r.repository.id == id)
    }

    fn injected(&mut self, op: Operation, endpoint: &str) -> Result<(), GitApiError> {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some((status, body)) => Err(api_error(endpoint, status, body)),
            None => Ok(()),
        }
    }

    fn insert(&mut self, project: &str, name: &str) -> GitRepository {
        let repository = GitRepository {
            id: RepositoryId::new(Uuid::new_v4().to_string()),
            name: name.to_string(),
            project: Some(TeamProjectReference {
                id: None,
                name: project.to_string(),
            }),
            default_branch: None,
            url: None,
            remote_url: None,
            web_url: None,
        };
        self.repositories.push(StoredRepository {
            project: project.to_string(),
            repository: repository.clone(),
            commits: Vec::new(),
            files: BTreeMap::new(),
        });
        repository
    }
}

fn api_error(endpoint: &str, status: u16, body: impl Into<String>) -> GitApiError {
    let endpoint = endpoint.to_string();
    let body = body.into();
    if status == 409 {
        GitApiError::Conflict { endpoint, body }
    } else {
        GitApiError::ApiError {
            endpoint,
            status,
            body,
        }
    }
}

/// In-memory [`GitService`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGitService {
    state: Arc<Mutex<State>>,
}

impl InMemoryGitService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty repository directly, bypassing call accounting.
    pub fn seed_repository(&self, project: &str, name: &str) -> GitRepository {
        let mut state = self.state.lock();
        if let Some(existing) = state.find(project, name) {
            return existing.repository.clone();
        }
        state.insert(project, name)
    }

    /// Land a commit as another writer would. Returns the new tip.
    ///
    /// The repository is created if it does not exist.
    pub fn land_commit(&self, project: &str, name: &str, path: &str, content: &str) -> CommitId {
        let mut state = self.state.lock();
        if state.find(project, name).is_none() {
            state.insert(project, name);
        }
        match state.find_mut(project, name) {
            Some(repo) => repo.append("external commit", &[(path, Some(content))]).commit_id,
            None => CommitId::null(),
        }
    }

    /// Fail the next call of `op` with the given status and body. Calls
    /// queue up: injecting twice fails the next two calls.
    pub fn fail_next(&self, op: Operation, status: u16, body: &str) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back((status, body.to_string()));
    }

    /// Let another writer land a commit just before each of the next `n`
    /// pushes, so those pushes carry a stale tip.
    pub fn race_next_pushes(&self, n: usize) {
        self.state.lock().races = n;
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Every push submitted, accepted or not.
    pub fn pushes(&self) -> Vec<GitPush> {
        self.state.lock().pushes.clone()
    }

    pub fn last_commit_query(&self) -> Option<CommitQuery> {
        self.state.lock().last_query
    }

    /// Content of `path` on the default branch, if present.
    pub fn file(&self, project: &str, name: &str, path: &str) -> Option<String> {
        let state = self.state.lock();
        state
            .find(project, name)
            .and_then(|r| r.files.get(path).cloned())
    }

    /// Commits of a repository, newest first.
    pub fn commits(&self, project: &str, name: &str) -> Vec<GitCommitRef> {
        let state = self.state.lock();
        state
            .find(project, name)
            .map(|r| r.commits.iter().rev().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GitService for InMemoryGitService {
    async fn repository_by_name(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<GitRepository>, GitApiError> {
        let mut state = self.state.lock();
        state.calls.get_repository += 1;
        state.injected(Operation::GetRepository, "GET /repositories/{name}")?;
        Ok(state.find(project, name).map(|r| r.repository.clone()))
    }

    async fn create_repository(
        &self,
        project: &str,
        name: &str,
    ) -> Result<GitRepository, GitApiError> {
        let endpoint = "POST /repositories";
        let mut state = self.state.lock();
        state.calls.create_repository += 1;
        state.injected(Operation::CreateRepository, endpoint)?;
        if state.find(project, name).is_some() {
            return Err(api_error(
                endpoint,
                409,
                format!("TF400948: A Git repository with the name {name} already exists."),
            ));
        }
        Ok(state.insert(project, name))
    }

    async fn query_commits(
        &self,
        project: &str,
        repository: &RepositoryId,
        query: CommitQuery,
    ) -> Result<Vec<GitCommitRef>, GitApiError> {
        let mut state = self.state.lock();
        state.calls.query_commits += 1;
        state.last_query = Some(query);
        state.injected(Operation::QueryCommits, "GET /commits")?;
        let commits = state
            .by_id_mut(project, repository)
            .map(|r| {
                r.commits
                    .iter()
                    .rev()
                    .skip(query.skip as usize)
                    .take(query.top as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(commits)
    }

    async fn submit_push(
        &self,
        project: &str,
        repository: &RepositoryId,
        push: &GitPush,
    ) -> Result<GitPushResult, GitApiError> {
        let endpoint = "POST /pushes";
        let mut state = self.state.lock();
        state.calls.push += 1;
        state.pushes.push(push.clone());
        state.injected(Operation::Push, endpoint)?;

        let racing = state.races > 0;
        if racing {
            state.races -= 1;
        }

        let Some(repo) = state.by_id_mut(project, repository) else {
            return Err(api_error(endpoint, 404, "TF401019: repository not found"));
        };
        if racing {
            repo.append("concurrent commit", &[]);
        }

        let [update] = push.ref_updates.as_slice() else {
            return Err(api_error(endpoint, 400, "exactly one ref update is supported"));
        };
        if update.name != DEFAULT_BRANCH {
            return Err(api_error(endpoint, 400, format!("unknown ref {}", update.name)));
        }
        if update.old_object_id != repo.tip() {
            return Err(api_error(
                endpoint,
                409,
                format!(
                    "TF401028: The reference '{}' has already been updated by another client",
                    update.name
                ),
            ));
        }

        // Validate the whole push against the branch plus everything staged
        // before it, then apply. A rejected push leaves the repository as is.
        let mut present: HashMap<&str, bool> = HashMap::new();
        let mut staged = Vec::with_capacity(push.commits.len());
        for commit in &push.commits {
            let mut changed = Vec::with_capacity(commit.changes.len());
            for change in &commit.changes {
                let path = change.item.path.as_str();
                let exists = present
                    .get(path)
                    .copied()
                    .unwrap_or_else(|| repo.files.contains_key(path));
                let content = change.new_content.as_ref().map(|c| c.content.as_str());
                let after = match change.change_type {
                    VersionControlChangeType::Add if exists => {
                        return Err(api_error(endpoint, 400, format!("item {path} already exists")));
                    }
                    VersionControlChangeType::Edit | VersionControlChangeType::Delete if !exists => {
                        return Err(api_error(endpoint, 400, format!("item {path} not found")));
                    }
                    VersionControlChangeType::Add | VersionControlChangeType::Edit => {
                        Some(content.unwrap_or_default())
                    }
                    VersionControlChangeType::Delete => None,
                };
                present.insert(path, after.is_some());
                changed.push((path, after));
            }
            staged.push((commit.comment.as_str(), changed));
        }

        let accepted: Vec<GitCommitRef> = staged
            .iter()
            .map(|(comment, changed)| repo.append(comment, changed))
            .collect();

        let new_tip = repo.tip();
        state.next_push_id += 1;
        Ok(GitPushResult {
            push_id: Some(state.next_push_id),
            date: Some(Utc::now()),
            commits: accepted,
            ref_updates: vec![GitRefUpdate {
                name: update.name.clone(),
                old_object_id: update.old_object_id.clone(),
                new_object_id: Some(new_tip),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_git_client::{GitChange, GitCommit, GitItem, ItemContent, ItemContentType};

    fn add(path: &str, content: &str, tip: CommitId) -> GitPush {
        GitPush {
            ref_updates: vec![GitRefUpdate {
                name: DEFAULT_BRANCH.into(),
                old_object_id: tip,
                new_object_id: None,
            }],
            commits: vec![GitCommit {
                comment: "c".into(),
                changes: vec![GitChange {
                    change_type: VersionControlChangeType::Add,
                    item: GitItem { path: path.into() },
                    new_content: Some(ItemContent {
                        content: content.into(),
                        content_type: ItemContentType::RawText,
                    }),
                }],
            }],
            repository: None,
        }
    }

    #[tokio::test]
    async fn names_are_case_insensitive_within_project() {
        let service = InMemoryGitService::new();
        service.seed_repository("P", "Reports");
        assert!(service.repository_by_name("P", "reports").await.unwrap().is_some());
        let err = service.create_repository("P", "REPORTS").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn push_advances_tip_and_sets_default_branch() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        assert_eq!(repo.default_branch, None);

        let result = service
            .submit_push("P", &repo.id, &add("/a.html", "a", CommitId::null()))
            .await
            .unwrap();
        let tip = result.new_tip(DEFAULT_BRANCH).cloned().unwrap();

        let latest = service
            .query_commits("P", &repo.id, CommitQuery::latest())
            .await
            .unwrap();
        assert_eq!(latest[0].commit_id, tip);
        let found = service.repository_by_name("P", "R").await.unwrap().unwrap();
        assert_eq!(found.default_branch.as_deref(), Some("refs/heads/master"));
    }

    #[tokio::test]
    async fn stale_push_changes_nothing() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        service.land_commit("P", "R", "/x.html", "x");

        let err = service
            .submit_push("P", &repo.id, &add("/a.html", "a", CommitId::null()))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(service.file("P", "R", "/a.html"), None);
        assert_eq!(service.commits("P", "R").len(), 1);
    }

    fn commit(comment: &str, change_type: VersionControlChangeType, path: &str) -> GitCommit {
        GitCommit {
            comment: comment.into(),
            changes: vec![GitChange {
                change_type,
                item: GitItem { path: path.into() },
                new_content: Some(ItemContent {
                    content: comment.into(),
                    content_type: ItemContentType::RawText,
                }),
            }],
        }
    }

    #[tokio::test]
    async fn duplicate_add_within_one_push_changes_nothing() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        let mut push = add("/a.html", "x", CommitId::null());
        push.commits.push(commit("again", VersionControlChangeType::Add, "/a.html"));

        let err = service.submit_push("P", &repo.id, &push).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(service.commits("P", "R").is_empty());
        assert_eq!(service.file("P", "R", "/a.html"), None);
    }

    #[tokio::test]
    async fn later_invalid_commit_rolls_back_earlier_ones() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        let tip = service.land_commit("P", "R", "/seed.html", "seed");
        let mut push = add("/a.html", "x", tip.clone());
        push.commits.push(commit("fix", VersionControlChangeType::Edit, "/missing.html"));

        let err = service.submit_push("P", &repo.id, &push).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(service.commits("P", "R").len(), 1);
        assert_eq!(service.commits("P", "R")[0].commit_id, tip);
        assert_eq!(service.file("P", "R", "/a.html"), None);
    }

    #[tokio::test]
    async fn staged_paths_are_visible_to_later_commits() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        let mut push = add("/a.html", "x", CommitId::null());
        push.commits.push(commit("edited", VersionControlChangeType::Edit, "/a.html"));
        push.commits.push(commit("gone", VersionControlChangeType::Delete, "/a.html"));

        let result = service.submit_push("P", &repo.id, &push).await.unwrap();

        assert_eq!(result.commits.len(), 3);
        assert_eq!(service.commits("P", "R").len(), 3);
        assert_eq!(service.file("P", "R", "/a.html"), None);
    }

    #[tokio::test]
    async fn adding_existing_path_is_rejected() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        let tip = service.land_commit("P", "R", "/a.html", "a");

        let err = service
            .submit_push("P", &repo.id, &add("/a.html", "b", tip))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(service.file("P", "R", "/a.html").as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn commit_paging_is_newest_first() {
        let service = InMemoryGitService::new();
        let repo = service.seed_repository("P", "R");
        let a = service.land_commit("P", "R", "/a", "a");
        let b = service.land_commit("P", "R", "/b", "b");
        let c = service.land_commit("P", "R", "/c", "c");

        let page = service
            .query_commits("P", &repo.id, CommitQuery { skip: 1, top: 2 })
            .await
            .unwrap();
        let ids: Vec<_> = page.into_iter().map(|c| c.commit_id).collect();
        assert_eq!(ids, vec![b, a]);
        assert_eq!(service.commits("P", "R")[0].commit_id, c);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let service = InMemoryGitService::new();
        service.fail_next(Operation::GetRepository, 500, "one");
        service.fail_next(Operation::GetRepository, 401, "two");

        let first = service.repository_by_name("P", "R").await.unwrap_err();
        let second = service.repository_by_name("P", "R").await.unwrap_err();
        assert_eq!(first.status(), Some(500));
        assert_eq!(second.status(), Some(401));
        assert!(service.repository_by_name("P", "R").await.unwrap().is_none());
        assert_eq!(service.calls().get_repository, 3);
    }
}
