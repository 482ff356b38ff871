//! Menu loop and the list/view/add/update/delete flows behind it.
//!
//! Every action opens fresh stores from the config, so what is shown always
//! matches the files. Failures are printed and the menu comes back; only end
//! of input leaves the loop.

use chrono::NaiveDate;
use colored::Colorize;
use tracing::debug;

use projtrack_core::{
    delete_project, delete_task, mint_id, update_task_list, validate_deadline, Field, LinkChange,
    Record, RecordKind, RecordStore, Result, StoreConfig, TrackerError, MAX_DEADLINE_ATTEMPTS,
};

use crate::display;
use crate::prompts::Prompter;

pub const FAREWELL: &str = "Goodbye! See you soon !! =)";

const INVALID_OPTION: &str = "Invalid option. Please try again.";

/// Where a submenu hands control back to
#[derive(Debug, PartialEq, Eq)]
enum Next {
    Back,
    Exit,
}

pub struct Shell<P: Prompter> {
    prompter: P,
    config: StoreConfig,
    today: NaiveDate,
}

impl<P: Prompter> Shell<P> {
    pub fn new(prompter: P, config: StoreConfig, today: NaiveDate) -> Self {
        Self {
            prompter,
            config,
            today,
        }
    }

    #[cfg(test)]
    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Runs the menus until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        match self.main_menu() {
            Ok(()) | Err(TrackerError::Interrupted) => self.prompter.say(FAREWELL),
            Err(e) => Err(e),
        }
    }

    fn main_menu(&mut self) -> Result<()> {
        loop {
            self.prompter.say(&main_menu_text())?;
            let next = match self.prompter.text("Choose an option:")?.trim() {
                "1" => self.submenu(RecordKind::Project)?,
                "2" => self.submenu(RecordKind::Task)?,
                "3" => Next::Exit,
                _ => {
                    self.warn(INVALID_OPTION)?;
                    self.pause()?;
                    Next::Back
                }
            };
            if next == Next::Exit {
                return Ok(());
            }
        }
    }

    fn submenu(&mut self, kind: RecordKind) -> Result<Next> {
        loop {
            self.prompter.say(&submenu_text(kind))?;
            let choice = self.prompter.text("Choose an option:")?;
            debug!(%kind, choice = choice.trim(), "menu choice");
            match choice.trim() {
                "1" => {
                    let result = self.list(kind);
                    self.report(result)?;
                    self.pause()?;
                }
                "2" => {
                    let result = self.view(kind);
                    self.report(result)?;
                    self.pause()?;
                }
                "3" => {
                    let result = self.add(kind);
                    self.report(result)?;
                    self.pause()?;
                }
                "4" => {
                    let result = self.update(kind);
                    self.report(result)?;
                }
                "5" => {
                    let result = self.delete(kind);
                    self.report(result)?;
                }
                "6" => return Ok(Next::Back),
                "7" => return Ok(Next::Exit),
                _ => {
                    self.warn(INVALID_OPTION)?;
                    self.pause()?;
                }
            }
        }
    }

    fn store(&self, kind: RecordKind) -> RecordStore {
        match kind {
            RecordKind::Project => self.config.projects(),
            RecordKind::Task => self.config.tasks(),
        }
    }

    fn list(&mut self, kind: RecordKind) -> Result<()> {
        let mut store = self.store(kind);
        store.load()?;
        self.prompter.say(&display::overview(kind, store.records()))
    }

    fn view(&mut self, kind: RecordKind) -> Result<()> {
        let mut store = self.store(kind);
        store.load()?;
        let id = self
            .prompter
            .text(&format!("Enter the {} id you want to view:", kind))?;
        let record = store.find_by_id(&id)?;

        let mut tasks = self.config.tasks();
        let task_ids = record.task_list().unwrap_or_default();
        if !task_ids.is_empty() {
            if let Err(e) = tasks.load_or_empty() {
                debug!(error = %e, "tasks unavailable for project view");
            }
        }
        let linked: Vec<&Record> = task_ids
            .iter()
            .filter_map(|task_id| tasks.find_by_id(task_id).ok())
            .collect();

        let out = display::detail(record, &linked);
        self.prompter.say(&out)
    }

    fn add(&mut self, kind: RecordKind) -> Result<()> {
        let mut store = self.store(kind);
        store.load_or_empty()?;

        let id = mint_id(&store);
        let mut record = Record::new(kind, id.clone(), self.today);
        record.name = self.answer(&format!("Enter {} name:", kind))?;
        record.description =
            self.answer(&format!("Enter a short description for the {}:", kind))?;
        record.detailed_description =
            self.answer(&format!("Enter a detailed description for the {}:", kind))?;
        let Some(deadline) = self.prompt_deadline()? else {
            return Ok(());
        };
        record.deadline = deadline;

        store.insert(record);
        store.save()?;
        self.success(&format!("Your {} has been added with id {}", kind, id))
    }

    fn update(&mut self, kind: RecordKind) -> Result<()> {
        let mut primary = self.store(kind);
        let mut secondary = self.store(kind.counterpart());
        primary.load()?;
        secondary.load_or_empty()?;

        let id = self.answer(&format!("Enter the {} id you want to update:", kind))?;
        let shown = display::detail(primary.find_by_id(&id)?, &[]);
        self.prompter.say(&shown)?;

        let property = self.answer("Which property do you want to update?")?;
        let field = Field::for_kind(&property, kind)?;
        let message = match field {
            Field::Id | Field::CreationDate => {
                return Err(TrackerError::ReadOnlyField {
                    field,
                    hint: "it is set when the record is added".to_string(),
                });
            }
            Field::LinkedProject => {
                return Err(TrackerError::ReadOnlyField {
                    field,
                    hint: "go to the project and update its task_list".to_string(),
                });
            }
            Field::TaskList => self.update_links(&mut primary, &mut secondary, &id)?,
            Field::Deadline => {
                let Some(deadline) = self.prompt_deadline()? else {
                    return Ok(());
                };
                primary.find_by_id_mut(&id)?.deadline = deadline;
                primary.save()?;
                format!("The property '{}' has been updated successfully!", field)
            }
            _ => {
                let value = self.answer("Enter the new value:")?;
                primary.find_by_id_mut(&id)?.set_field(field, &value)?;
                primary.save()?;
                format!("The property '{}' has been updated successfully!", field)
            }
        };
        self.success(&message)
    }

    fn update_links(
        &mut self,
        projects: &mut RecordStore,
        tasks: &mut RecordStore,
        project_id: &str,
    ) -> Result<String> {
        self.prompter
            .say(&format!("List of tasks: {:?}", tasks.all_ids()))?;
        self.prompter
            .say(&format!("Already used tasks: {:?}", projects.claimed_task_ids()))?;
        let task_id = self.answer("Enter the id of the task to add to this project:")?;

        let prompter = &mut self.prompter;
        let mut confirm = |question: &str| prompter.confirm(question);
        let change = update_task_list(projects, tasks, project_id, &task_id, &mut confirm)?;
        Ok(match change {
            LinkChange::Linked => format!("Task {} added to project {}", task_id, project_id.trim()),
            LinkChange::Unlinked => {
                format!("Task {} removed from project {}", task_id, project_id.trim())
            }
        })
    }

    fn delete(&mut self, kind: RecordKind) -> Result<()> {
        let mut primary = self.store(kind);
        let mut secondary = self.store(kind.counterpart());
        primary.load()?;

        let id = self.answer(&format!("Enter the {} id you want to delete:", kind))?;
        let shown = display::detail(primary.find_by_id(&id)?, &[]);
        self.prompter.say(&shown)?;

        let question = format!("Are you sure you want to delete this {}?", kind);
        if !self.prompter.confirm(&question)? {
            return self.warn("The deletion has been cancelled");
        }

        let report = match kind {
            RecordKind::Project => delete_project(&mut primary, &mut secondary, &id)?,
            RecordKind::Task => delete_task(&mut primary, &mut secondary, &id)?,
        };
        self.success(&format!("Your {} has been deleted successfully", kind))?;
        if !report.repaired.is_empty() {
            self.prompter.say(&format!(
                "Also updated {} {}",
                kind.counterpart(),
                report.repaired.join(", ")
            ))?;
        }
        Ok(())
    }

    /// Asks for a deadline until one validates, giving up after the limit
    fn prompt_deadline(&mut self) -> Result<Option<String>> {
        for _ in 0..MAX_DEADLINE_ATTEMPTS {
            let value = self.answer("Enter deadline (YYYY-MM-DD, e.g. 2025-12-31):")?;
            match validate_deadline(&value, self.today) {
                Ok(_) => return Ok(Some(value)),
                Err(e) => self.warn(&e.to_string())?,
            }
        }
        self.warn(&format!("{} wrong attempts, start again", MAX_DEADLINE_ATTEMPTS))?;
        Ok(None)
    }

    fn answer(&mut self, message: &str) -> Result<String> {
        Ok(self.prompter.text(message)?.trim().to_string())
    }

    fn pause(&mut self) -> Result<()> {
        self.prompter.text("Press Enter to continue ...").map(|_| ())
    }

    /// Prints a failed action, keeping only end of input fatal
    fn report(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(TrackerError::Interrupted) => Err(TrackerError::Interrupted),
            Err(e @ TrackerError::UpdateCancelled) => self.warn(&e.to_string()),
            Err(e) => self.prompter.say(&e.to_string().red().to_string()),
        }
    }

    fn success(&mut self, message: &str) -> Result<()> {
        self.prompter.say(&message.green().to_string())
    }

    fn warn(&mut self, message: &str) -> Result<()> {
        self.prompter.say(&message.yellow().to_string())
    }
}

fn main_menu_text() -> String {
    format!(
        "{}\n  1. Manage your projects\n  2. Manage your tasks\n  3. Exit",
        "What do you want to do?".blue().bold()
    )
}

fn submenu_text(kind: RecordKind) -> String {
    format!(
        "{}\n  1. Display {kind}s\n  2. Display a {kind} with id\n  3. Add {kind}\n  4. Update {kind}\n  5. Delete {kind}\n  6. Back\n  7. Exit",
        "What do you want to do?".blue().bold(),
        kind = kind
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    /// Replays fixed answers; running out of them is end of input
    struct ScriptedPrompter {
        answers: VecDeque<String>,
        transcript: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                transcript: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn text(&mut self, message: &str) -> Result<String> {
            self.transcript.push(message.to_string());
            self.answers.pop_front().ok_or(TrackerError::Interrupted)
        }

        fn say(&mut self, line: &str) -> Result<()> {
            self.transcript.push(line.to_string());
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn config(dir: &TempDir) -> StoreConfig {
        StoreConfig {
            projects_file: dir.path().join("DB/projects.csv"),
            tasks_file: dir.path().join("DB/tasks.csv"),
        }
    }

    /// Runs a scripted session and returns everything that was shown
    fn run(dir: &TempDir, answers: &[&str]) -> String {
        colored::control::set_override(false);
        let mut shell = Shell::new(ScriptedPrompter::new(answers), config(dir), today());
        shell.run().unwrap();
        shell.into_prompter().transcript.join("\n")
    }

    fn seed(dir: &TempDir, projects: &[&str], tasks: &[&str]) {
        let config = config(dir);
        let mut project_store = config.projects();
        for id in projects {
            let mut record = Record::new(RecordKind::Project, *id, today());
            record.name = format!("Project {}", id);
            project_store.insert(record);
        }
        if !projects.is_empty() {
            project_store.save().unwrap();
        }
        let mut task_store = config.tasks();
        for id in tasks {
            let mut record = Record::new(RecordKind::Task, *id, today());
            record.name = format!("Task {}", id);
            task_store.insert(record);
        }
        if !tasks.is_empty() {
            task_store.save().unwrap();
        }
    }

    fn load(dir: &TempDir, kind: RecordKind) -> Result<Vec<Record>> {
        let mut store = RecordStore::new(
            kind,
            match kind {
                RecordKind::Project => config(dir).projects_file,
                RecordKind::Task => config(dir).tasks_file,
            },
        );
        let records = store.load()?.to_vec();
        Ok(records)
    }

    #[test]
    fn test_end_of_input_says_goodbye() {
        let dir = TempDir::new().unwrap();
        let out = run(&dir, &[]);
        assert!(out.ends_with(FAREWELL));

        let out = run(&dir, &["1", "3", "Website"]);
        assert!(out.ends_with(FAREWELL));
        assert!(load(&dir, RecordKind::Project).is_err());
    }

    #[test]
    fn test_exit_from_top_menu() {
        let dir = TempDir::new().unwrap();
        let out = run(&dir, &["3", "1"]);
        assert!(out.ends_with(FAREWELL));
        assert_eq!(out.matches("Choose an option:").count(), 1);
    }

    #[test]
    fn test_add_project() {
        let dir = TempDir::new().unwrap();
        let out = run(
            &dir,
            &["1", "3", " Website ", "Short", "Long", "2025-12-31", "", "7"],
        );
        assert!(out.contains("Your project has been added with id 1"));

        let projects = load(&dir, RecordKind::Project).unwrap();
        assert_eq!(projects.len(), 1);
        let project = &projects[0];
        assert_eq!(project.name, "Website");
        assert_eq!(project.detailed_description, "Long");
        assert_eq!(project.creation_date, today());
        assert_eq!(project.deadline, "2025-12-31");
        assert_eq!(project.state, "To do");
        assert!(project.task_list().unwrap().is_empty());
    }

    #[test]
    fn test_add_reuses_freed_id() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &[], &["1", "3"]);
        run(&dir, &["2", "3", "New", "", "", "2025-01-01", "", "7"]);

        let tasks = load(&dir, RecordKind::Task).unwrap();
        assert!(tasks.iter().any(|t| t.id == "2" && t.name == "New"));
    }

    #[test]
    fn test_add_gives_up_after_three_bad_deadlines() {
        let dir = TempDir::new().unwrap();
        let out = run(
            &dir,
            &["1", "3", "n", "d", "dd", "2024-12-31", "2025-1-1", "soon", "", "7"],
        );
        assert!(out.contains("3 wrong attempts, start again"));
        assert!(!config(&dir).projects_file.exists());
    }

    #[test]
    fn test_list_and_view() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1"], &["1", "2"]);
        run(&dir, &["1", "4", "1", "task_list", "2", "7"]);

        let out = run(&dir, &["1", "1", "", "2", "1", "", "7"]);
        assert!(out.contains("Project 1"));
        assert!(out.contains("Project Tasks:"));
        assert!(out.contains("Task 2"));
        assert!(!out.contains("Task 1 "));
    }

    #[test]
    fn test_list_without_file_reports_and_returns_to_menu() {
        let dir = TempDir::new().unwrap();
        let out = run(&dir, &["1", "1", "", "6", "3"]);
        assert!(out.contains("No project found for file"));
        assert!(out.ends_with(FAREWELL));
    }

    #[test]
    fn test_update_name() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1", "2"], &[]);
        let out = run(&dir, &["1", "4", "2", "name", "Renamed", "7"]);
        assert!(out.contains("The property 'name' has been updated successfully!"));

        let projects = load(&dir, RecordKind::Project).unwrap();
        assert_eq!(projects[0].name, "Project 1");
        assert_eq!(projects[1].name, "Renamed");
    }

    #[test]
    fn test_update_unknown_and_read_only_properties() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1"], &["1"]);
        let out = run(
            &dir,
            &["2", "4", "1", "owner", "4", "1", "linked_project", "4", "1", "id", "7"],
        );
        assert!(out.contains("The property 'owner' does not exist in the task"));
        assert!(out.contains("go to the project and update its task_list"));
        assert!(out.contains("The property 'id' cannot be updated directly"));
    }

    #[test]
    fn test_update_deadline_is_validated() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1"], &[]);
        run(&dir, &["1", "4", "1", "deadline", "2020-01-01", "2026-03-01", "7"]);
        assert_eq!(load(&dir, RecordKind::Project).unwrap()[0].deadline, "2026-03-01");
    }

    #[test]
    fn test_link_toggle_through_task_list() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1", "2"], &["1"]);

        let out = run(&dir, &["1", "4", "1", "task_list", "1", "4", "2", "task_list", "1", "7"]);
        assert!(out.contains("Task 1 added to project 1"));
        assert!(out.contains("Task 1 is already used in project 1"));
        assert_eq!(load(&dir, RecordKind::Task).unwrap()[0].linked_project(), Some("1"));

        let out = run(&dir, &["1", "4", "1", "task_list", "1", "no", "7"]);
        assert!(out.contains("The update was cancelled"));

        let out = run(&dir, &["1", "4", "1", "task_list", "1", "y", "7"]);
        assert!(out.contains("Task 1 removed from project 1"));
        assert_eq!(load(&dir, RecordKind::Task).unwrap()[0].linked_project(), None);
        assert!(load(&dir, RecordKind::Project).unwrap()[0]
            .task_list()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_declined_keeps_record() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1"], &[]);
        let out = run(&dir, &["1", "5", "1", "nope", "7"]);
        assert!(out.contains("The deletion has been cancelled"));
        assert_eq!(load(&dir, RecordKind::Project).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_last_project_empties_file_and_unlinks_tasks() {
        let dir = TempDir::new().unwrap();
        seed(&dir, &["1"], &["1", "2"]);
        run(&dir, &["1", "4", "1", "task_list", "1", "4", "1", "task_list", "2", "7"]);

        let out = run(&dir, &["1", "5", "1", "YES", "7"]);
        assert!(out.contains("Your project has been deleted successfully"));
        assert!(out.contains("Also updated task 1, 2"));

        assert!(matches!(
            load(&dir, RecordKind::Project),
            Err(TrackerError::Empty { .. })
        ));
        assert_eq!(fs::read_to_string(config(&dir).projects_file).unwrap(), "");
        let tasks = load(&dir, RecordKind::Task).unwrap();
        assert!(tasks.iter().all(|t| t.linked_project().is_none()));
    }

    #[test]
    fn test_invalid_options() {
        let dir = TempDir::new().unwrap();
        let out = run(&dir, &["9", "", "2", "x", "", "6", "3"]);
        assert_eq!(out.matches(INVALID_OPTION).count(), 2);
        assert!(out.ends_with(FAREWELL));
    }
}
