//! Request and response bodies
//!
//! Response types implement [`Projection`] with an explicit field list, so the
//! wire shape of each resource is decided here and nowhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::Projection;
use crate::models::{Category, Todo, User};

/// Shortest accepted todo title
pub const TITLE_MIN_LEN: usize = 3;
/// Shortest accepted todo description
pub const DESCRIPTION_MIN_LEN: usize = 3;
/// Longest accepted todo description
pub const DESCRIPTION_MAX_LEN: usize = 100;
/// Accepted todo priorities
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=5;
/// Shortest accepted new password
pub const NEW_PASSWORD_MIN_LEN: usize = 6;

/// Todo as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    pub owner_id: i64,
    pub category_id: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Projection<Todo> for TodoResponse {
    fn project(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            priority: todo.priority,
            complete: todo.complete,
            owner_id: todo.owner_id,
            category_id: todo.category_id,
            completed_at: todo.completed_at,
        }
    }
}

/// Category as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl Projection<Category> for CategoryResponse {
    fn project(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// User profile as returned to clients; never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
}

impl Projection<User> for UserResponse {
    fn project(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            phone_number: user.phone_number,
            is_active: user.is_active,
        }
    }
}

/// Body of `POST /todo` and `PUT /todo/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRequest {
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl TodoRequest {
    /// Validate field constraints
    pub fn validate(&self) -> Result<(), String> {
        if self.title.chars().count() < TITLE_MIN_LEN {
            return Err(format!(
                "title must be at least {} characters",
                TITLE_MIN_LEN
            ));
        }
        let description_len = self.description.chars().count();
        if !(DESCRIPTION_MIN_LEN..=DESCRIPTION_MAX_LEN).contains(&description_len) {
            return Err(format!(
                "description must be between {} and {} characters",
                DESCRIPTION_MIN_LEN, DESCRIPTION_MAX_LEN
            ));
        }
        if !PRIORITY_RANGE.contains(&self.priority) {
            return Err(format!(
                "priority must be between {} and {}",
                PRIORITY_RANGE.start(),
                PRIORITY_RANGE.end()
            ));
        }
        if matches!(self.category_id, Some(id) if id < 1) {
            return Err("category_id must be positive".to_string());
        }
        Ok(())
    }

    /// New todo owned by `owner_id`; `completed_at` is stamped when created complete
    pub fn into_todo(self, owner_id: i64, now: DateTime<Utc>) -> Todo {
        let mut todo = Todo {
            id: 0,
            title: self.title,
            description: self.description,
            priority: self.priority,
            complete: false,
            owner_id,
            category_id: self.category_id,
            completed_at: None,
        };
        todo.set_complete(self.complete, now);
        todo
    }

    /// Replace the editable fields of `todo`
    pub fn apply_to(self, todo: &mut Todo, now: DateTime<Utc>) {
        todo.title = self.title;
        todo.description = self.description;
        todo.priority = self.priority;
        todo.category_id = self.category_id;
        todo.set_complete(self.complete, now);
    }
}

/// Body of `POST /categories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

impl CategoryRequest {
    /// Validate field constraints
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Body of `PUT /user/password`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordChangeRequest {
    pub password: String,
    pub new_password: String,
}

impl PasswordChangeRequest {
    /// Validate field constraints
    pub fn validate(&self) -> Result<(), String> {
        if self.new_password.chars().count() < NEW_PASSWORD_MIN_LEN {
            return Err(format!(
                "new_password must be at least {} characters",
                NEW_PASSWORD_MIN_LEN
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TodoRequest {
        TodoRequest {
            title: "Walk the dog".to_string(),
            description: "Around the park".to_string(),
            priority: 3,
            complete: false,
            category_id: None,
        }
    }

    #[test]
    fn test_valid_todo_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_todo_request_bounds() {
        let short_title = TodoRequest {
            title: "ab".to_string(),
            ..request()
        };
        assert!(short_title.validate().is_err());

        let long_description = TodoRequest {
            description: "x".repeat(101),
            ..request()
        };
        assert!(long_description.validate().is_err());

        let max_description = TodoRequest {
            description: "x".repeat(100),
            ..request()
        };
        assert!(max_description.validate().is_ok());

        for priority in [0, 6, -1] {
            let bad = TodoRequest {
                priority,
                ..request()
            };
            assert!(bad.validate().is_err(), "priority {}", priority);
        }
    }

    #[test]
    fn test_lengths_count_characters() {
        let multibyte = TodoRequest {
            title: "été".to_string(),
            ..request()
        };
        assert!(multibyte.validate().is_ok());
    }

    #[test]
    fn test_category_id_defaults_to_none() {
        let body: TodoRequest = serde_json::from_str(
            r#"{"title":"abc","description":"def","priority":1,"complete":false}"#,
        )
        .unwrap();
        assert_eq!(body.category_id, None);
    }

    #[test]
    fn test_into_todo_stamps_completed() {
        let now = Utc::now();
        let todo = TodoRequest {
            complete: true,
            ..request()
        }
        .into_todo(4, now);
        assert_eq!(todo.owner_id, 4);
        assert_eq!(todo.completed_at, Some(now));
    }

    #[test]
    fn test_user_projection_excludes_hash() {
        let user = User {
            id: 2,
            email: "b@example.com".to_string(),
            username: "bob".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            hashed_password: "$argon2id$hash".to_string(),
            is_active: true,
            role: "user".to_string(),
            phone_number: Some("555-0100".to_string()),
        };
        let json = serde_json::to_value(UserResponse::project(user)).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 8);
        assert!(!keys.iter().any(|k| k.contains("password")));
    }

    #[test]
    fn test_password_change_validation() {
        let short = PasswordChangeRequest {
            password: "old".to_string(),
            new_password: "12345".to_string(),
        };
        assert!(short.validate().is_err());
        let ok = PasswordChangeRequest {
            password: "old".to_string(),
            new_password: "123456".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
