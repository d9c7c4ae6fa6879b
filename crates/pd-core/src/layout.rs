//! Remote queue directory layout
//!
//! Everything the relay shares with the remote watcher lives under
//! `<project>/.plandrop/`:
//!
//! ```text
//! .plandrop/
//! ├── plans/<id>.json          plan submitted by the relay
//! ├── responses/<id>.jsonl     output streamed by the watcher
//! ├── completed/               plans the watcher has finished
//! ├── watch.sh                 watcher script deployed by init_queue
//! ├── heartbeat                watcher liveness timestamp
//! ├── session_id               current agent session
//! ├── session_history.jsonl    ended sessions, append-only
//! └── interrupt                cancellation marker
//! ```
//!
//! Paths are built only from a validated project root and [`Identifier`]s,
//! so no caller-supplied text can step outside the queue directory.

use std::fmt;

use crate::error::ValidationError;
use crate::validate::{validate_identifier, validate_path};

/// Queue directory name under the project root
pub const QUEUE_DIR: &str = ".plandrop";

/// Agent settings directory under the project root
pub const SETTINGS_DIR: &str = ".claude";

/// Watcher script file name
pub const WATCH_SCRIPT: &str = "watch.sh";

/// A plan or session identifier matching `[A-Za-z0-9_-]+`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a plan identifier
    pub fn plan(id: &str) -> Result<Self, ValidationError> {
        validate_identifier("plan_id", id).map(|id| Self(id.to_string()))
    }

    /// Validate a session identifier
    pub fn session(id: &str) -> Result<Self, ValidationError> {
        validate_identifier("session_id", id).map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Paths of the queue directory for one remote project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLayout {
    project: String,
}

impl QueueLayout {
    /// Create a layout rooted at a validated project path
    pub fn new(project: &str) -> Result<Self, ValidationError> {
        let project = validate_path(project)?;
        // "/" trims to "", which still joins to "/.plandrop"
        Ok(Self {
            project: project.trim_end_matches('/').to_string(),
        })
    }

    /// The project root without trailing slashes
    pub fn project(&self) -> &str {
        &self.project
    }

    /// `<project>/.plandrop`
    pub fn root(&self) -> String {
        format!("{}/{}", self.project, QUEUE_DIR)
    }

    fn entry(&self, name: &str) -> String {
        format!("{}/{}", self.root(), name)
    }

    pub fn plans_dir(&self) -> String {
        self.entry("plans")
    }

    pub fn responses_dir(&self) -> String {
        self.entry("responses")
    }

    pub fn completed_dir(&self) -> String {
        self.entry("completed")
    }

    /// Directories created by queue initialization
    pub fn directories(&self) -> [String; 3] {
        [self.plans_dir(), self.responses_dir(), self.completed_dir()]
    }

    pub fn plan_file(&self, id: &Identifier) -> String {
        format!("{}/{}.json", self.plans_dir(), id)
    }

    pub fn response_file(&self, id: &Identifier) -> String {
        format!("{}/{}.jsonl", self.responses_dir(), id)
    }

    pub fn watch_script(&self) -> String {
        self.entry(WATCH_SCRIPT)
    }

    pub fn heartbeat_file(&self) -> String {
        self.entry("heartbeat")
    }

    pub fn session_file(&self) -> String {
        self.entry("session_id")
    }

    pub fn session_history_file(&self) -> String {
        self.entry("session_history.jsonl")
    }

    pub fn interrupt_file(&self) -> String {
        self.entry("interrupt")
    }

    /// `<project>/.claude`
    pub fn settings_dir(&self) -> String {
        format!("{}/{}", self.project, SETTINGS_DIR)
    }

    /// `<project>/.claude/settings.json`
    pub fn settings_file(&self) -> String {
        format!("{}/settings.json", self.settings_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = QueueLayout::new("/srv/app").unwrap();
        let id = Identifier::plan("abc123").unwrap();

        assert_eq!(layout.root(), "/srv/app/.plandrop");
        assert_eq!(layout.plan_file(&id), "/srv/app/.plandrop/plans/abc123.json");
        assert_eq!(
            layout.response_file(&id),
            "/srv/app/.plandrop/responses/abc123.jsonl"
        );
        assert_eq!(layout.heartbeat_file(), "/srv/app/.plandrop/heartbeat");
        assert_eq!(layout.session_file(), "/srv/app/.plandrop/session_id");
        assert_eq!(
            layout.session_history_file(),
            "/srv/app/.plandrop/session_history.jsonl"
        );
        assert_eq!(layout.interrupt_file(), "/srv/app/.plandrop/interrupt");
        assert_eq!(layout.watch_script(), "/srv/app/.plandrop/watch.sh");
        assert_eq!(layout.settings_file(), "/srv/app/.claude/settings.json");
        assert_eq!(
            layout.directories(),
            [
                "/srv/app/.plandrop/plans".to_string(),
                "/srv/app/.plandrop/responses".to_string(),
                "/srv/app/.plandrop/completed".to_string(),
            ]
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let layout = QueueLayout::new("/srv/app/").unwrap();
        assert_eq!(layout.root(), "/srv/app/.plandrop");
    }

    #[test]
    fn test_project_at_root() {
        let layout = QueueLayout::new("/").unwrap();
        assert_eq!(layout.root(), "/.plandrop");
    }

    #[test]
    fn test_rejects_bad_project() {
        assert!(QueueLayout::new("/srv/app;reboot").is_err());
        assert!(QueueLayout::new("").is_err());
    }

    #[test]
    fn test_identifier_rejects_traversal() {
        assert!(Identifier::plan("../../etc/passwd").is_err());
        assert!(Identifier::session("a;b").is_err());
        assert_eq!(Identifier::session("3f2a-9c_1").unwrap().as_str(), "3f2a-9c_1");
    }
}
