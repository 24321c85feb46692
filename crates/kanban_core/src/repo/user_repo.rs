//! User repository. Users exist here only as owners and assignees.

use crate::db::{sqlite_code, DbError};
use crate::model::user::{User, UserId};
use crate::model::EntityKind;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    user_uuid,
    email,
    display_name,
    created_at
FROM users";

pub trait UserRepository {
    fn create_user(&self, email: &str, display_name: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, email: &str, display_name: &str) -> RepoResult<User> {
        let user_uuid = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO users (user_uuid, email, display_name, is_deleted)
             VALUES (?1, ?2, ?3, 0);",
            params![user_uuid.to_string(), email, display_name],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if sqlite_code(&err) == Some(ErrorCode::ConstraintViolation) => {
                return Err(RepoError::Duplicate {
                    kind: EntityKind::User,
                    key: email.to_string(),
                });
            }
            Err(err) => return Err(RepoError::Db(DbError::Sqlite(err))),
        }

        self.get_user(user_uuid)?.ok_or(RepoError::NotFound {
            kind: EntityKind::User,
            id: user_uuid,
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE user_uuid = ?1
               AND is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let user_uuid_text: String = row.get("user_uuid")?;
    Ok(User {
        user_uuid: parse_uuid(&user_uuid_text, "users.user_uuid")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        created_at: row.get("created_at")?,
    })
}
