use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    /// 1-based position among the todos sharing `parent_id`.
    pub sequence: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub parent_id: Option<Uuid>,
    pub level: u8,
}

impl Todo {
    pub fn new(
        title: impl Into<String>,
        parent_id: Option<Uuid>,
        level: u8,
        sequence: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            sequence,
            created_at: Utc::now(),
            completed_at: None,
            parent_id,
            level,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// A root todo together with its subtodos, both ordered by sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoNode {
    pub todo: Todo,
    pub subtodos: Vec<Todo>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Ocean,
    Sunset,
    Forest,
    Purple,
    Fire,
    Sky,
    Dark,
    Light,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Ocean,
        Theme::Sunset,
        Theme::Forest,
        Theme::Purple,
        Theme::Fire,
        Theme::Sky,
        Theme::Dark,
        Theme::Light,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Theme::Ocean => "ocean",
            Theme::Sunset => "sunset",
            Theme::Forest => "forest",
            Theme::Purple => "purple",
            Theme::Fire => "fire",
            Theme::Sky => "sky",
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Ocean => "Ocean Blue",
            Theme::Sunset => "Sunset Orange",
            Theme::Forest => "Forest Green",
            Theme::Purple => "Royal Purple",
            Theme::Fire => "Fire Pink",
            Theme::Sky => "Sky Blue",
            Theme::Dark => "Dark Mode",
            Theme::Light => "Light Mode",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.key() == key)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub calendar_enabled: bool,
    pub calendar_connected: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalendarStatus {
    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub todos_count: usize,
    pub calendar_enabled: bool,
    pub calendar_connected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_uses_lowercase_names() {
        let up: Direction = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(up, Direction::Up);
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), "\"down\"");
    }

    #[test]
    fn theme_lookup_by_key() {
        assert_eq!(Theme::from_key("forest"), Some(Theme::Forest));
        assert_eq!(Theme::from_key("blue_gradient"), None);
        assert_eq!(Theme::default().name(), "Ocean Blue");
        for theme in Theme::ALL {
            assert_eq!(Theme::from_key(theme.key()), Some(theme));
        }
    }

    #[test]
    fn new_todo_parent_is_optional() {
        let todo: NewTodo = serde_json::from_str(r#"{"title":"milk"}"#).unwrap();
        assert_eq!(todo.title, "milk");
        assert!(todo.parent_id.is_none());
    }
}
