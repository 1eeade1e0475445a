//! PostgreSQL entity store
//!
//! SQL is assembled with `sqlx::QueryBuilder` from the entity's field table.
//! Identifiers only ever come from that static table and every value is a bind
//! parameter, so request input never reaches the SQL text.
//!
//! Expected schema (see `migrations/0001_create_tables.sql`): one table per
//! entity named by [`Entity::TABLE`], one column per field, `id` a generated
//! `BIGINT` primary key, and unique indexes on [`Entity::UNIQUE`] fields.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::entity::{Entity, FieldKind, FieldValue};
use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::query::{Predicate, QueryDescriptor, Window};
use super::traits::{EntityStore, RepositoryResult, Storage};
use crate::models::{Category, Todo, User};

/// Escape `LIKE` metacharacters so the needle matches literally
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, kind: FieldKind, value: FieldValue) {
    match value {
        FieldValue::Null => match kind {
            FieldKind::Integer => builder.push_bind(None::<i64>),
            FieldKind::Text => builder.push_bind(None::<String>),
            FieldKind::Boolean => builder.push_bind(None::<bool>),
            FieldKind::Timestamp => builder.push_bind(None::<DateTime<Utc>>),
        },
        FieldValue::Integer(n) => builder.push_bind(n),
        FieldValue::Text(s) => builder.push_bind(s),
        FieldValue::Boolean(b) => builder.push_bind(b),
        FieldValue::Timestamp(ts) => builder.push_bind(ts),
    };
}

fn unknown_field<E: Entity>(operation: RepositoryOperation, field: &str) -> RepositoryError {
    RepositoryError::database_error(operation, format!("unknown field `{}`", field))
        .with_entity(E::NAME, field)
}

fn push_where<E: Entity>(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &QueryDescriptor<E>,
    operation: RepositoryOperation,
) -> RepositoryResult<()> {
    for (i, predicate) in query.predicates().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Eq { field, value } => {
                let def = E::field(field).ok_or_else(|| unknown_field::<E>(operation, field))?;
                builder.push(def.name);
                if value.is_null() {
                    builder.push(" IS NULL");
                } else {
                    builder.push(" = ");
                    push_value(builder, def.kind, value.clone());
                }
            }
            Predicate::Contains { fields, needle } => {
                let pattern = format!("%{}%", escape_like(needle));
                builder.push("(");
                for (j, field) in fields.iter().enumerate() {
                    let def =
                        E::field(field).ok_or_else(|| unknown_field::<E>(operation, field))?;
                    if j > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(def.name);
                    builder.push(" ILIKE ");
                    builder.push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
    Ok(())
}

fn push_order<E: Entity>(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &QueryDescriptor<E>,
) -> RepositoryResult<()> {
    match query.ordering() {
        Some(order) => {
            let def = E::sortable_field(order.field)
                .ok_or_else(|| unknown_field::<E>(RepositoryOperation::Fetch, order.field))?;
            builder.push(" ORDER BY ");
            builder.push(def.name);
            // nulls sort as the smallest value in both directions
            builder.push(if order.direction.is_descending() {
                " DESC NULLS LAST"
            } else {
                " ASC NULLS FIRST"
            });
            builder.push(", id ASC");
        }
        None => {
            builder.push(" ORDER BY id ASC");
        }
    }
    Ok(())
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// PostgreSQL collection of one entity type
#[derive(Debug)]
pub struct PgStore<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PgStore<E> {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn classify(operation: RepositoryOperation, err: sqlx::Error) -> RepositoryError {
        let error = RepositoryError::from_sqlx(operation, err);
        match error.kind {
            RepositoryErrorKind::AlreadyExists => {
                let field = error.entity_id.clone().unwrap_or_default();
                error.with_entity(E::NAME, field)
            }
            _ => error,
        }
    }
}

impl<E> EntityStore<E> for PgStore<E>
where
    E: Entity + for<'r> FromRow<'r, PgRow> + Unpin,
{
    async fn count(&self, query: &QueryDescriptor<E>) -> RepositoryResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        builder.push(E::TABLE);
        push_where(&mut builder, query, RepositoryOperation::Count)?;

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::classify(RepositoryOperation::Count, e))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn fetch(&self, query: &QueryDescriptor<E>, window: Window) -> RepositoryResult<Vec<E>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        builder.push(E::TABLE);
        push_where(&mut builder, query, RepositoryOperation::Fetch)?;
        push_order(&mut builder, query)?;
        builder.push(" LIMIT ");
        builder.push_bind(clamp(window.limit));
        builder.push(" OFFSET ");
        builder.push_bind(clamp(window.offset));

        tracing::debug!(table = E::TABLE, sql = builder.sql(), "Fetching rows");

        builder
            .build_query_as::<E>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::classify(RepositoryOperation::Fetch, e))
    }

    async fn find_one(&self, query: &QueryDescriptor<E>) -> RepositoryResult<Option<E>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        builder.push(E::TABLE);
        push_where(&mut builder, query, RepositoryOperation::FindOne)?;
        push_order(&mut builder, query)?;
        builder.push(" LIMIT 1");

        builder
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::classify(RepositoryOperation::FindOne, e))
    }

    async fn insert(&self, entity: E) -> RepositoryResult<E> {
        let columns: Vec<_> = E::FIELDS.iter().filter(|def| def.name != "id").collect();

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
        builder.push(E::TABLE);
        builder.push(" (");
        for (i, def) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(def.name);
        }
        builder.push(") VALUES (");
        for (i, def) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, def.kind, (def.accessor)(&entity));
        }
        builder.push(") RETURNING *");

        let inserted = builder
            .build_query_as::<E>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::classify(RepositoryOperation::Insert, e))?;
        tracing::debug!(entity = E::NAME, id = inserted.id(), "Inserted row");
        Ok(inserted)
    }

    async fn update(&self, entity: E) -> RepositoryResult<E> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder.push(E::TABLE);
        builder.push(" SET ");
        for (i, def) in E::FIELDS.iter().filter(|def| def.name != "id").enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(def.name);
            builder.push(" = ");
            push_value(&mut builder, def.kind, (def.accessor)(&entity));
        }
        builder.push(" WHERE id = ");
        builder.push_bind(entity.id());
        builder.push(" RETURNING *");

        builder
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::classify(RepositoryOperation::Update, e))?
            .ok_or_else(|| {
                RepositoryError::not_found(E::NAME, entity.id().to_string())
                    .with_operation(RepositoryOperation::Update)
            })
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder.push(E::TABLE);
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let affected = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| Self::classify(RepositoryOperation::Delete, e))?
            .rows_affected();

        if affected == 0 {
            return Err(RepositoryError::not_found(E::NAME, id.to_string())
                .with_operation(RepositoryOperation::Delete));
        }
        tracing::debug!(entity = E::NAME, id, "Deleted row");
        Ok(())
    }
}

/// All collections backed by one PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStorage {
    todos: PgStore<Todo>,
    categories: PgStore<Category>,
    users: PgStore<User>,
}

impl PgStorage {
    /// Create collections sharing `pool`
    pub fn new(pool: PgPool) -> Self {
        Self {
            todos: PgStore::new(pool.clone()),
            categories: PgStore::new(pool.clone()),
            users: PgStore::new(pool),
        }
    }
}

impl Storage for PgStorage {
    type Todos = PgStore<Todo>;
    type Categories = PgStore<Category>;
    type Users = PgStore<User>;

    fn todos(&self) -> &Self::Todos {
        &self.todos
    }

    fn categories(&self) -> &Self::Categories {
        &self.categories
    }

    fn users(&self) -> &Self::Users {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::OrderInstruction;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_where_clause_binds_values() {
        let query = QueryDescriptor::<Todo>::new()
            .eq("owner_id", 3_i64)
            .eq("category_id", None::<i64>)
            .contains(&["title", "description"], "milk");
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM todos");
        push_where(&mut builder, &query, RepositoryOperation::Fetch).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT * FROM todos WHERE owner_id = $1 AND category_id IS NULL \
             AND (title ILIKE $2 OR description ILIKE $3)"
        );
    }

    #[test]
    fn test_order_clause_adds_id_tiebreak() {
        let query = QueryDescriptor::<Todo>::new().order_by(OrderInstruction::desc("priority"));
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM todos");
        push_order(&mut builder, &query).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT * FROM todos ORDER BY priority DESC NULLS LAST, id ASC"
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let query = QueryDescriptor::<Todo>::new().eq("drop table", 1_i64);
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM todos");
        assert!(push_where(&mut builder, &query, RepositoryOperation::Fetch).is_err());

        let query = QueryDescriptor::<Category>::new().order_by(OrderInstruction::asc("secret"));
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM categories");
        assert!(push_order(&mut builder, &query).is_err());
    }
}
