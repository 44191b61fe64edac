//! Local auth provider backed by SQLite credential records.
//!
//! Credentials live in `auth.db` (salted SHA-256 digests, never plaintext).
//! A successful sign-in writes a session token to `session.json` in the
//! data directory, which is what `restore` finds on the next process start.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, watch};
use tracing::debug;
use uuid::Uuid;

use super::{AuthError, AuthProvider, MIN_PASSWORD_LEN, Principal};
use crate::Result;

/// File holding the persisted session token.
const SESSION_FILE: &str = "session.json";

/// Persisted session state: which principal the stored token belongs to.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    principal_id: String,
}

/// Auth provider storing credentials locally.
pub struct LocalAuthProvider {
    conn: Mutex<Connection>,
    session_path: PathBuf,
    sessions: watch::Sender<Option<Principal>>,
}

impl LocalAuthProvider {
    /// Open or create the credential database under the data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let conn = Connection::open(data_dir.join("auth.db"))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                display_name TEXT
            );
            "#,
        )?;

        let (sessions, _) = watch::channel(None);

        Ok(Self {
            conn: Mutex::new(conn),
            session_path: data_dir.join(SESSION_FILE),
            sessions,
        })
    }

    fn hash_password(salt: &str, password: &str) -> String {
        format!("{:x}", Sha256::digest(format!("{salt}:{password}")))
    }

    fn load_principal(
        conn: &Connection,
        id: &str,
    ) -> std::result::Result<Option<Principal>, AuthError> {
        conn.query_row(
            "SELECT id, email, display_name FROM credentials WHERE id = ?1",
            params![id],
            |row| {
                Ok(Principal {
                    id: row.get(0)?,
                    email: Some(row.get(1)?),
                    display_name: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| AuthError::Unknown(e.to_string()))
    }

    fn persist_session(&self, principal: &Principal) -> std::result::Result<(), AuthError> {
        let session = PersistedSession {
            token: Uuid::new_v4().simple().to_string(),
            principal_id: principal.id.clone(),
        };
        let body =
            serde_json::to_string(&session).map_err(|e| AuthError::Unknown(e.to_string()))?;
        std::fs::write(&self.session_path, body).map_err(|e| AuthError::Unknown(e.to_string()))
    }
}

impl AuthProvider for LocalAuthProvider {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Principal, AuthError> {
        let principal = {
            let conn = self.conn.lock().await;
            let row: Option<(String, String, String)> = conn
                .query_row(
                    "SELECT id, salt, password_hash FROM credentials WHERE email = ?1",
                    params![email],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|e| AuthError::Unknown(e.to_string()))?;

            let (id, salt, stored_hash) = row.ok_or(AuthError::InvalidCredentials)?;
            if Self::hash_password(&salt, password) != stored_hash {
                return Err(AuthError::InvalidCredentials);
            }
            Self::load_principal(&conn, &id)?.ok_or(AuthError::InvalidCredentials)?
        };

        self.persist_session(&principal)?;
        let _ = self.sessions.send(Some(principal.clone()));
        debug!(principal = %principal.id, "signed in");
        Ok(principal)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> std::result::Result<Principal, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let principal = {
            let conn = self.conn.lock().await;
            let taken: Option<String> = conn
                .query_row(
                    "SELECT id FROM credentials WHERE email = ?1",
                    params![email],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| AuthError::Unknown(e.to_string()))?;
            if taken.is_some() {
                return Err(AuthError::EmailInUse);
            }

            let id = format!("uid-{}", Uuid::new_v4().simple());
            let salt = Uuid::new_v4().simple().to_string();
            conn.execute(
                "INSERT INTO credentials (id, email, salt, password_hash, display_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    email,
                    salt,
                    Self::hash_password(&salt, password),
                    display_name
                ],
            )
            .map_err(|e| AuthError::Unknown(e.to_string()))?;

            Principal {
                id,
                email: Some(email.to_string()),
                display_name: display_name.map(String::from),
            }
        };

        self.persist_session(&principal)?;
        let _ = self.sessions.send(Some(principal.clone()));
        debug!(principal = %principal.id, "signed up");
        Ok(principal)
    }

    async fn sign_out(&self) -> std::result::Result<(), AuthError> {
        match std::fs::remove_file(&self.session_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AuthError::Unknown(e.to_string())),
        }
        let _ = self.sessions.send(None);
        debug!("signed out");
        Ok(())
    }

    async fn restore(&self) -> std::result::Result<Option<Principal>, AuthError> {
        let body = match std::fs::read_to_string(&self.session_path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let _ = self.sessions.send(None);
                return Ok(None);
            }
            Err(e) => return Err(AuthError::Unknown(e.to_string())),
        };

        // A corrupt session file is treated as signed out, not fatal.
        let Ok(session) = serde_json::from_str::<PersistedSession>(&body) else {
            let _ = self.sessions.send(None);
            return Ok(None);
        };

        let principal = {
            let conn = self.conn.lock().await;
            Self::load_principal(&conn, &session.principal_id)?
        };
        let _ = self.sessions.send(principal.clone());
        if let Some(p) = &principal {
            debug!(principal = %p.id, "session restored");
        }
        Ok(principal)
    }

    fn session_changes(&self) -> watch::Receiver<Option<Principal>> {
        self.sessions.subscribe()
    }
}
