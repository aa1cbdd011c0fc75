use crate::{model::workspace::Workspace, Db};
use uuid::Uuid;

impl Db {
    pub fn insert_workspace(&self, workspace: Workspace) {
        self.inner.workspaces.write().insert(workspace.id, workspace);
    }

    #[must_use]
    pub fn workspace(&self, id: Uuid) -> Option<Workspace> {
        self.inner.workspaces.read().get(&id).cloned()
    }
}
