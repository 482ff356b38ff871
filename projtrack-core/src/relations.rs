//! Keeps project task lists and task back-references consistent.
//!
//! The store being changed is always saved first. Cascades run afterwards
//! against a freshly loaded counterpart store and are best-effort: a failure
//! there is logged and leaves only a stale back-reference behind, which a
//! later repair clears.

use tracing::{info, warn};

use crate::error::{Missing, Result, TrackerError};
use crate::models::{Confirmation, Field, Record, RecordKind};
use crate::storage::RecordStore;

/// What `update_task_list` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Linked,
    Unlinked,
}

/// Outcome of a delete with its cascade
#[derive(Debug, Clone)]
pub struct DeleteReport {
    pub deleted: Record,
    /// Ids of counterpart records whose back-reference was cleared
    pub repaired: Vec<String>,
}

/// Toggles `task_id` in a project's task list.
///
/// A task already listed by this project is unlinked (after confirmation),
/// anything else is linked.
pub fn update_task_list(
    projects: &mut RecordStore,
    tasks: &mut RecordStore,
    project_id: &str,
    task_id: &str,
    confirm: &mut dyn Confirmation,
) -> Result<LinkChange> {
    let (project_id, task_id) = (project_id.trim(), task_id.trim());
    if projects
        .find_by_id(project_id)?
        .field_contains(Field::TaskList, task_id)
    {
        unlink_task(projects, tasks, project_id, task_id, confirm)?;
        Ok(LinkChange::Unlinked)
    } else {
        link_task(projects, tasks, project_id, task_id)?;
        Ok(LinkChange::Linked)
    }
}

/// Adds `task_id` to a project and points the task back at it, then saves
/// both stores. A store is only updated in memory once its save succeeded,
/// and nothing changes when the link is rejected.
pub fn link_task(
    projects: &mut RecordStore,
    tasks: &mut RecordStore,
    project_id: &str,
    task_id: &str,
) -> Result<()> {
    let (project_id, task_id) = (project_id.trim(), task_id.trim());
    projects.find_by_id(project_id)?;

    if let Ok(owner) = projects.find_project_by_task_id(task_id) {
        if owner.id != project_id {
            return Err(TrackerError::TaskAlreadyLinked {
                task_id: task_id.to_string(),
                project_id: owner.id.clone(),
            });
        }
        return Err(TrackerError::DuplicateLink {
            incoming: vec![task_id.to_string()],
            current: owner.task_list().unwrap_or_default().to_vec(),
        });
    }

    let task = tasks.find_by_id(task_id)?;
    if let Some(stale) = task.linked_project().filter(|p| *p != project_id) {
        warn!(task_id, stale_project = stale, project_id, "overwriting stale project link");
    }

    let mut next_projects = projects.clone();
    if let Some(task_list) = next_projects.find_by_id_mut(project_id)?.task_list_mut() {
        task_list.push(task_id.to_string());
    }
    let mut next_tasks = tasks.clone();
    next_tasks
        .find_by_id_mut(task_id)?
        .set_linked_project(Some(project_id.to_string()));

    commit(projects, next_projects)?;
    commit(tasks, next_tasks)?;
    info!(task_id, project_id, "linked task to project");
    Ok(())
}

/// Removes `task_id` from a project's task list and clears the task's link,
/// after `confirm` agrees. Declining yields `UpdateCancelled`.
pub fn unlink_task(
    projects: &mut RecordStore,
    tasks: &mut RecordStore,
    project_id: &str,
    task_id: &str,
    confirm: &mut dyn Confirmation,
) -> Result<()> {
    let (project_id, task_id) = (project_id.trim(), task_id.trim());
    if !projects
        .find_by_id(project_id)?
        .field_contains(Field::TaskList, task_id)
    {
        return Err(TrackerError::NotFound {
            kind: RecordKind::Project,
            missing: Missing::FieldValue {
                field: Field::TaskList,
                value: task_id.to_string(),
            },
        });
    }

    let question = format!(
        "Task {} is already in the task list of project {}. Do you want to remove it?",
        task_id, project_id
    );
    if !confirm.confirm(&question)? {
        return Err(TrackerError::UpdateCancelled);
    }

    let mut next_projects = projects.clone();
    if let Some(task_list) = next_projects.find_by_id_mut(project_id)?.task_list_mut() {
        task_list.retain(|id| id != task_id);
    }
    let mut next_tasks = tasks.clone();
    let task_changed = match next_tasks.find_by_id_mut(task_id) {
        Ok(task) if task.linked_project() == Some(project_id) => task.set_linked_project(None),
        Ok(_) => false,
        Err(_) => {
            warn!(task_id, project_id, "unlinking a task id with no task record");
            false
        }
    };

    commit(projects, next_projects)?;
    if task_changed {
        commit(tasks, next_tasks)?;
    }
    info!(task_id, project_id, "unlinked task from project");
    Ok(())
}

/// Saves `next` and only then makes it the caller's store
fn commit(store: &mut RecordStore, mut next: RecordStore) -> Result<()> {
    next.save()?;
    *store = next;
    Ok(())
}

/// Deletes a project, saves, then clears the link of every task pointing at it
pub fn delete_project(
    projects: &mut RecordStore,
    tasks: &mut RecordStore,
    project_id: &str,
) -> Result<DeleteReport> {
    let deleted = projects.remove(project_id)?;
    projects.save_or_truncate()?;

    let repaired = repair_project_references(tasks, &deleted.id).unwrap_or_else(|e| {
        warn!(project_id = %deleted.id, error = %e, "could not repair task links");
        Vec::new()
    });
    Ok(DeleteReport { deleted, repaired })
}

/// Deletes a task, saves, then drops its id from every project listing it
pub fn delete_task(
    tasks: &mut RecordStore,
    projects: &mut RecordStore,
    task_id: &str,
) -> Result<DeleteReport> {
    let deleted = tasks.remove(task_id)?;
    tasks.save_or_truncate()?;

    let repaired = repair_task_references(projects, &deleted.id).unwrap_or_else(|e| {
        warn!(task_id = %deleted.id, error = %e, "could not repair project task lists");
        Vec::new()
    });
    Ok(DeleteReport { deleted, repaired })
}

/// Reloads `tasks` and unlinks every task pointing at `project_id`.
/// Returns the ids of the repaired tasks; none is not an error.
pub fn repair_project_references(tasks: &mut RecordStore, project_id: &str) -> Result<Vec<String>> {
    tasks.load_or_empty()?;
    let linked = tasks.tasks_linked_to(project_id);
    if linked.is_empty() {
        return Ok(linked);
    }
    for id in &linked {
        tasks.find_by_id_mut(id)?.set_linked_project(None);
    }
    tasks.save()?;
    info!(project_id, tasks = ?linked, "cleared task links to deleted project");
    Ok(linked)
}

/// Reloads `projects` and removes `task_id` from every task list.
/// Returns the ids of the repaired projects; none is not an error.
pub fn repair_task_references(projects: &mut RecordStore, task_id: &str) -> Result<Vec<String>> {
    projects.load_or_empty()?;
    let owners: Vec<String> = projects
        .records()
        .iter()
        .filter(|p| p.field_contains(Field::TaskList, task_id))
        .map(|p| p.id.clone())
        .collect();
    if owners.is_empty() {
        return Ok(owners);
    }
    for id in &owners {
        if let Some(task_list) = projects.find_by_id_mut(id)?.task_list_mut() {
            task_list.retain(|t| t != task_id);
        }
    }
    projects.save()?;
    info!(task_id, projects = ?owners, "removed deleted task from task lists");
    Ok(owners)
}
