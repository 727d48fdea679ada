use std::collections::HashMap;

use chrono::Utc;
use todo_api::v1::{Direction, Todo, TodoNode};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calendar::{Completion, CompletionNotifier, NoopNotifier};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("todo title cannot be empty")]
    EmptyTitle,
    #[error("subtodos cannot have subtodos of their own")]
    NestingTooDeep,
    #[error("todo {0} not found")]
    NotFound(Uuid),
    #[error("parent todo {0} not found")]
    ParentNotFound(Uuid),
}

/// In-memory forest of todos, at most two levels deep.
///
/// `siblings` keeps every sibling group in display order, so a todo's
/// `sequence` is always its index in that group plus one.
#[derive(Debug)]
pub struct TodoStore {
    todos: HashMap<Uuid, Todo>,
    siblings: HashMap<Option<Uuid>, Vec<Uuid>>,
    notifier: Box<dyn CompletionNotifier>,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::with_notifier(NoopNotifier)
    }
}

impl TodoStore {
    pub fn with_notifier(notifier: impl CompletionNotifier + 'static) -> Self {
        Self {
            todos: HashMap::new(),
            siblings: HashMap::new(),
            notifier: Box::new(notifier),
        }
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&Todo> {
        self.todos.get(&id)
    }

    pub fn create(&mut self, title: &str, parent_id: Option<Uuid>) -> Result<Todo, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let level = match parent_id {
            None => 0,
            Some(parent_id) => {
                let parent = self
                    .todos
                    .get(&parent_id)
                    .ok_or(StoreError::ParentNotFound(parent_id))?;

                if !parent.is_root() {
                    return Err(StoreError::NestingTooDeep);
                }

                parent.level + 1
            }
        };

        let group = self.siblings.entry(parent_id).or_default();
        let todo = Todo::new(title, parent_id, level, group.len() as u32 + 1);
        group.push(todo.id);
        self.todos.insert(todo.id, todo.clone());

        // a new incomplete subtodo reopens a finished parent
        if let Some(parent_id) = parent_id {
            self.rederive_parent(parent_id);
        }

        Ok(todo)
    }

    pub fn toggle(&mut self, id: Uuid) -> Result<(), StoreError> {
        let todo = self.todos.get(&id).ok_or(StoreError::NotFound(id))?;

        if todo.is_root() && !todo.completed && self.has_subtodos(id) {
            debug!(%id, "parent completion follows its subtodos, ignoring toggle");
            return Ok(());
        }

        let todo = self.todos.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        todo.completed = !todo.completed;
        todo.completed_at = todo.completed.then(Utc::now);

        let parent_id = todo.parent_id;
        let notice = todo.completed.then(|| {
            let headline = match parent_id {
                None => "Main task completed via Todo App",
                Some(_) => "Subtask completed via Todo App",
            };
            completion_notice(todo, headline)
        });

        if let Some(notice) = notice {
            self.notify(notice);
        }

        if let Some(parent_id) = parent_id {
            self.rederive_parent(parent_id);
        }

        Ok(())
    }

    pub fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        let todo = self.todos.remove(&id).ok_or(StoreError::NotFound(id))?;

        match todo.parent_id {
            None => {
                let subtodos = self.siblings.remove(&Some(id)).unwrap_or_default();
                for subtodo in &subtodos {
                    self.todos.remove(subtodo);
                }

                debug!(%id, subtodos = subtodos.len(), "removed root todo");
                self.detach(None, id);
            }
            Some(parent_id) => {
                self.detach(Some(parent_id), id);
                self.rederive_parent(parent_id);
            }
        }

        Ok(())
    }

    /// Swaps a todo with its neighbour. Returns whether anything moved.
    pub fn move_todo(&mut self, id: Uuid, direction: Direction) -> bool {
        let Some(parent_id) = self.todos.get(&id).map(|todo| todo.parent_id) else {
            return false;
        };
        let Some(group) = self.siblings.get_mut(&parent_id) else {
            return false;
        };
        let Some(index) = group.iter().position(|other| *other == id) else {
            return false;
        };

        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|next| *next < group.len()),
        };
        let Some(target) = target else {
            return false;
        };

        group.swap(index, target);
        for position in [index, target] {
            if let Some(todo) = self.todos.get_mut(&group[position]) {
                todo.sequence = position as u32 + 1;
            }
        }

        true
    }

    pub fn list_hierarchical(&self) -> Vec<TodoNode> {
        self.group(None)
            .map(|root| TodoNode {
                todo: root.clone(),
                subtodos: self.group(Some(root.id)).cloned().collect(),
            })
            .collect()
    }

    fn group(&self, parent_id: Option<Uuid>) -> impl Iterator<Item = &Todo> + '_ {
        self.siblings
            .get(&parent_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.todos.get(id))
    }

    fn has_subtodos(&self, id: Uuid) -> bool {
        self.siblings
            .get(&Some(id))
            .is_some_and(|group| !group.is_empty())
    }

    /// Removes `id` from its sibling group and closes the gap it leaves.
    fn detach(&mut self, parent_id: Option<Uuid>, id: Uuid) {
        let now_empty = match self.siblings.get_mut(&parent_id) {
            Some(group) => {
                group.retain(|other| *other != id);
                group.is_empty()
            }
            None => false,
        };

        if now_empty {
            self.siblings.remove(&parent_id);
        }

        self.renumber(parent_id);
    }

    fn renumber(&mut self, parent_id: Option<Uuid>) {
        let Some(group) = self.siblings.get(&parent_id) else {
            return;
        };

        for (index, id) in group.iter().enumerate() {
            if let Some(todo) = self.todos.get_mut(id) {
                todo.sequence = index as u32 + 1;
            }
        }
    }

    fn rederive_parent(&mut self, parent_id: Uuid) {
        let Some(group) = self.siblings.get(&Some(parent_id)) else {
            return;
        };
        if group.is_empty() {
            return;
        }

        let count = group.len();
        let all_completed = group
            .iter()
            .filter_map(|id| self.todos.get(id))
            .all(|todo| todo.completed);

        let Some(parent) = self.todos.get_mut(&parent_id) else {
            return;
        };

        let notice = if all_completed && !parent.completed {
            parent.completed = true;
            parent.completed_at = Some(Utc::now());
            debug!(id = %parent.id, "all subtodos done, completing parent");

            let headline =
                format!("Parent task completed via Todo App\nAll {count} subtodos completed");
            Some(completion_notice(parent, &headline))
        } else {
            if !all_completed && parent.completed {
                parent.completed = false;
                parent.completed_at = None;
                debug!(id = %parent.id, "subtodo reopened, reopening parent");
            }
            None
        };

        if let Some(notice) = notice {
            self.notify(notice);
        }
    }

    fn notify(&self, notice: Completion) {
        if !self.notifier.notify_completion(&notice) {
            warn!(title = %notice.title, "failed to hand completion to calendar");
        }
    }
}

fn completion_notice(todo: &Todo, headline: &str) -> Completion {
    let end_time = todo.completed_at.unwrap_or_else(Utc::now);

    Completion {
        title: todo.title.clone(),
        start_time: todo.created_at,
        end_time,
        description: format!(
            "{headline}\nCreated: {}",
            todo.created_at.format("%Y-%m-%d %H:%M")
        ),
    }
}
