//! User accounts.

use libsql::Connection;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::{self, Row, params};
use crate::error::{Error, Result};
use crate::guard::Identity;
use crate::role::Role;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Role given to self-registered accounts.
pub const DEFAULT_ROLE: Role = Role::Editor;

/// A user as returned by the API. The password hash never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.role)
    }

    fn from_row(row: &Row) -> Result<Self> {
        let role: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role: role
                .parse()
                .map_err(|_| Error::Internal(format!("Stored role is invalid: {role}")))?,
            created_at: row.get(4)?,
        })
    }
}

/// Registration input.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty()
        {
            return Err(Error::BadRequest("All fields are required".into()));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

const COLUMNS: &str = "id, name, email, role, created_at";

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Register a new account with [`DEFAULT_ROLE`].
pub async fn register(conn: &Connection, input: NewUser) -> Result<User> {
    input.validate()?;
    let email = normalize_email(&input.email);

    if find_by_email(conn, &email).await?.is_some() {
        return Err(Error::Conflict("Email already registered".into()));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        email,
        role: DEFAULT_ROLE,
        created_at: db::now(),
    };
    let password_hash = auth::hash_password(&input.password)?;

    // A concurrent registration may have won since the lookup
    let inserted = conn
        .execute(
            "INSERT INTO users (id, name, email, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(email) DO NOTHING",
            params![
                user.id.as_str(),
                user.name.as_str(),
                user.email.as_str(),
                password_hash,
                user.role.as_str(),
                user.created_at
            ],
        )
        .await?;
    if inserted == 0 {
        return Err(Error::Conflict("Email already registered".into()));
    }

    tracing::info!(user = %user.id, "Registered user");
    Ok(user)
}

/// Check credentials, returning the user on success.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<User> {
    let mut rows = conn
        .query(
            &format!("SELECT {COLUMNS}, password_hash FROM users WHERE email = ?1"),
            params![normalize_email(email)],
        )
        .await?;

    let Some(row) = rows.next().await? else {
        return Err(Error::InvalidCredentials);
    };
    let hash: String = row.get(5)?;
    if !auth::verify_password(password, &hash) {
        return Err(Error::InvalidCredentials);
    }
    User::from_row(&row)
}

pub async fn find(conn: &Connection, id: &str) -> Result<Option<User>> {
    let mut rows = conn
        .query(
            &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(User::from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let mut rows = conn
        .query(
            &format!("SELECT {COLUMNS} FROM users WHERE email = ?1"),
            params![normalize_email(email)],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(User::from_row(&row)?)),
        None => Ok(None),
    }
}

/// All users, oldest first.
pub async fn list(conn: &Connection) -> Result<Vec<User>> {
    let mut rows = conn
        .query(
            &format!("SELECT {COLUMNS} FROM users ORDER BY created_at, email"),
            (),
        )
        .await?;
    let mut users = Vec::new();
    while let Some(row) = rows.next().await? {
        users.push(User::from_row(&row)?);
    }
    Ok(users)
}

/// Change a user's role. Takes effect for tokens issued afterwards.
pub async fn set_role(conn: &Connection, id: &str, role: Role) -> Result<User> {
    let changed = conn
        .execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )
        .await?;
    if changed == 0 {
        return Err(Error::NotFound(format!("user {id}")));
    }
    tracing::info!(user = %id, %role, "Changed role");
    find(conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {id}")))
}
