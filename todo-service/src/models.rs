//! Stored entities
//!
//! Each entity declares its field table for the query pipeline. Field names
//! double as column names for the SQL backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{Entity, FieldDef, FieldKind, FieldValue};

/// Role string that grants administrative access
pub const ADMIN_ROLE: &str = "admin";

/// A task owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    pub owner_id: i64,
    pub category_id: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entity for Todo {
    const NAME: &'static str = "Todo";
    const TABLE: &'static str = "todos";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef {
            name: "id",
            kind: FieldKind::Integer,
            accessor: |t: &Todo| FieldValue::Integer(t.id),
            sortable: true,
        },
        FieldDef {
            name: "title",
            kind: FieldKind::Text,
            accessor: |t: &Todo| FieldValue::Text(t.title.clone()),
            sortable: true,
        },
        FieldDef {
            name: "description",
            kind: FieldKind::Text,
            accessor: |t: &Todo| FieldValue::Text(t.description.clone()),
            sortable: true,
        },
        FieldDef {
            name: "priority",
            kind: FieldKind::Integer,
            accessor: |t: &Todo| FieldValue::from(t.priority),
            sortable: true,
        },
        FieldDef {
            name: "complete",
            kind: FieldKind::Boolean,
            accessor: |t: &Todo| FieldValue::Boolean(t.complete),
            sortable: true,
        },
        FieldDef {
            name: "owner_id",
            kind: FieldKind::Integer,
            accessor: |t: &Todo| FieldValue::Integer(t.owner_id),
            sortable: true,
        },
        FieldDef {
            name: "category_id",
            kind: FieldKind::Integer,
            accessor: |t: &Todo| FieldValue::from(t.category_id),
            sortable: true,
        },
        FieldDef {
            name: "completed_at",
            kind: FieldKind::Timestamp,
            accessor: |t: &Todo| FieldValue::from(t.completed_at),
            sortable: true,
        },
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn with_id(self, id: i64) -> Self {
        Self { id, ..self }
    }
}

impl Todo {
    /// Apply a completion state, maintaining `completed_at`
    ///
    /// Marking an open todo complete stamps `now`; marking an already complete
    /// todo complete keeps the original stamp; reopening clears it.
    pub fn set_complete(&mut self, complete: bool, now: DateTime<Utc>) {
        if complete {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.complete = complete;
    }
}

/// A shared label todos can be filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Entity for Category {
    const NAME: &'static str = "Category";
    const TABLE: &'static str = "categories";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef {
            name: "id",
            kind: FieldKind::Integer,
            accessor: |c: &Category| FieldValue::Integer(c.id),
            sortable: true,
        },
        FieldDef {
            name: "name",
            kind: FieldKind::Text,
            accessor: |c: &Category| FieldValue::Text(c.name.clone()),
            sortable: true,
        },
    ];
    const UNIQUE: &'static [&'static str] = &["name"];

    fn id(&self) -> i64 {
        self.id
    }

    fn with_id(self, id: i64) -> Self {
        Self { id, ..self }
    }
}

/// An account. Users are never listed, so no field is sortable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_active: bool,
    pub role: String,
    pub phone_number: Option<String>,
}

impl User {
    /// Whether this account holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

impl Entity for User {
    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const FIELDS: &'static [FieldDef<Self>] = &[
        FieldDef {
            name: "id",
            kind: FieldKind::Integer,
            accessor: |u: &User| FieldValue::Integer(u.id),
            sortable: false,
        },
        FieldDef {
            name: "email",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::Text(u.email.clone()),
            sortable: false,
        },
        FieldDef {
            name: "username",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::Text(u.username.clone()),
            sortable: false,
        },
        FieldDef {
            name: "first_name",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::Text(u.first_name.clone()),
            sortable: false,
        },
        FieldDef {
            name: "last_name",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::Text(u.last_name.clone()),
            sortable: false,
        },
        FieldDef {
            name: "hashed_password",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::Text(u.hashed_password.clone()),
            sortable: false,
        },
        FieldDef {
            name: "is_active",
            kind: FieldKind::Boolean,
            accessor: |u: &User| FieldValue::Boolean(u.is_active),
            sortable: false,
        },
        FieldDef {
            name: "role",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::Text(u.role.clone()),
            sortable: false,
        },
        FieldDef {
            name: "phone_number",
            kind: FieldKind::Text,
            accessor: |u: &User| FieldValue::from(u.phone_number.clone()),
            sortable: false,
        },
    ];
    const UNIQUE: &'static [&'static str] = &["email", "username", "phone_number"];

    fn id(&self) -> i64 {
        self.id
    }

    fn with_id(self, id: i64) -> Self {
        Self { id, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_todo() -> Todo {
        Todo {
            id: 1,
            title: "Learn axum".to_string(),
            description: "Read the router docs".to_string(),
            priority: 4,
            complete: false,
            owner_id: 1,
            category_id: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_completion_stamps_now() {
        let now = Utc::now();
        let mut todo = open_todo();
        todo.set_complete(true, now);
        assert!(todo.complete);
        assert_eq!(todo.completed_at, Some(now));
    }

    #[test]
    fn test_completion_keeps_existing_stamp() {
        let earlier = Utc::now() - Duration::hours(2);
        let mut todo = open_todo();
        todo.set_complete(true, earlier);
        todo.set_complete(true, Utc::now());
        assert_eq!(todo.completed_at, Some(earlier));
    }

    #[test]
    fn test_reopening_clears_stamp() {
        let mut todo = open_todo();
        todo.set_complete(true, Utc::now());
        todo.set_complete(false, Utc::now());
        assert!(!todo.complete);
        assert!(todo.completed_at.is_none());
    }

    #[test]
    fn test_sortable_allow_lists() {
        let todo_sortable: Vec<_> = Todo::FIELDS
            .iter()
            .filter(|f| f.sortable)
            .map(|f| f.name)
            .collect();
        assert_eq!(
            todo_sortable,
            vec![
                "id",
                "title",
                "description",
                "priority",
                "complete",
                "owner_id",
                "category_id",
                "completed_at"
            ]
        );
        assert!(Category::sortable_field("name").is_some());
        assert!(User::FIELDS.iter().all(|f| !f.sortable));
    }

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let user = User {
            id: 1,
            email: "a@example.com".to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            hashed_password: "$argon2id$secret".to_string(),
            is_active: true,
            role: ADMIN_ROLE.to_string(),
            phone_number: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(user.is_admin());
    }
}
