//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::UserId;
use kernel::pagination::PageRequest;
use kernel::search::contains_pattern;
use platform::task::run_to_completion;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::{
    credential::Credential,
    password_reset::PasswordReset,
    refresh_token::{RefreshToken, Replacement, Rotation, TokenState},
    user::User,
};
use crate::domain::repository::{
    CredentialRepository, PasswordResetRepository, RefreshTokenRepository, UserFilter,
    UserRepository,
};
use crate::domain::value_object::{
    email::Email, profile::FullName, user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    role,
    blocked,
    full_name,
    bio,
    avatar_url,
    last_login_at,
    created_at,
    updated_at
"#;

const REFRESH_TOKEN_COLUMNS: &str = r#"
    token_id,
    family_id,
    user_id,
    token_hash,
    issued_at,
    expires_at,
    revoked_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete expired refresh tokens and password resets
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = Utc::now();

        let tokens = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let resets = sqlx::query("DELETE FROM password_resets WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(
            refresh_tokens_deleted = tokens,
            password_resets_deleted = resets,
            "Cleaned up expired auth tokens"
        );

        Ok(tokens + resets)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

async fn insert_user_with_credential(
    pool: PgPool,
    user: User,
    credential: Credential,
) -> AuthResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (
            user_id,
            email,
            role,
            blocked,
            full_name,
            bio,
            avatar_url,
            last_login_at,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(user.user_id.into_uuid())
    .bind(user.email.as_str())
    .bind(user.role.code())
    .bind(user.blocked)
    .bind(user.full_name.as_str())
    .bind(&user.bio)
    .bind(&user.avatar_url)
    .bind(user.last_login_at)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::EmailTaken
        } else {
            AuthError::Database(e)
        }
    })?;

    sqlx::query(
        r#"
        INSERT INTO user_credentials (user_id, password_hash, updated_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(credential.user_id.into_uuid())
    .bind(credential.password_hash.as_str())
    .bind(credential.updated_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

fn push_user_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    builder.push(" WHERE TRUE");
    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role.code());
    }
    if let Some(blocked) = filter.blocked {
        builder.push(" AND blocked = ").push_bind(blocked);
    }
    if let Some(query) = &filter.query {
        let pattern = contains_pattern(query);
        builder
            .push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User, credential: &Credential) -> AuthResult<()> {
        run_to_completion(insert_user_with_credential(
            self.pool.clone(),
            user.clone(),
            credential.clone(),
        ))
        .await?
    }

    async fn find_user_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                role = $2,
                blocked = $3,
                full_name = $4,
                bio = $5,
                avatar_url = $6,
                last_login_at = $7,
                updated_at = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.into_uuid())
        .bind(user.role.code())
        .bind(user.blocked)
        .bind(user.full_name.as_str())
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn search_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AuthResult<(Vec<User>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_user_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, user_id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<AuthResult<Vec<_>>>()?;

        Ok((users, u64::try_from(total).unwrap_or(0)))
    }
}

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn find_credential(&self, user_id: &UserId) -> AuthResult<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT user_id, password_hash, updated_at
            FROM user_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credential()).transpose()
    }

    async fn update_credential(&self, credential: &Credential) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE user_credentials SET
                password_hash = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(credential.user_id.into_uuid())
        .bind(credential.password_hash.as_str())
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

async fn insert_token<'e, E>(executor: E, token: &RefreshToken) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (
            token_id,
            family_id,
            user_id,
            token_hash,
            issued_at,
            expires_at,
            revoked_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(token.token_id)
    .bind(token.family_id)
    .bind(token.user_id.into_uuid())
    .bind(&token.token_hash)
    .bind(token.issued_at)
    .bind(token.expires_at)
    .bind(token.revoked_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn rotate_in_transaction(
    pool: PgPool,
    presented_hash: Vec<u8>,
    replacement: Replacement,
) -> AuthResult<Rotation> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
        "SELECT {REFRESH_TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = $1 FOR UPDATE"
    ))
    .bind(&presented_hash)
    .fetch_optional(&mut *tx)
    .await?;

    // Dropping `tx` without commit rolls back
    let Some(mut current) = row.map(RefreshTokenRow::into_token) else {
        return Ok(Rotation::Rejected);
    };

    match current.state(replacement.issued_at) {
        TokenState::Expired => Ok(Rotation::Rejected),
        TokenState::Revoked => {
            sqlx::query(
                "UPDATE refresh_tokens SET revoked_at = $2 WHERE family_id = $1 AND revoked_at IS NULL",
            )
            .bind(current.family_id)
            .bind(replacement.issued_at)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            Ok(Rotation::Reused {
                user_id: current.user_id,
                family_id: current.family_id,
            })
        }
        TokenState::Active => {
            let successor = current.rotate(replacement);

            sqlx::query("UPDATE refresh_tokens SET revoked_at = $2 WHERE token_id = $1")
                .bind(current.token_id)
                .bind(current.revoked_at)
                .execute(&mut *tx)
                .await?;
            insert_token(&mut *tx, &successor).await?;
            tx.commit().await?;

            Ok(Rotation::Rotated(successor))
        }
    }
}

impl RefreshTokenRepository for PgAuthRepository {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> AuthResult<()> {
        insert_token(&self.pool, token).await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        presented_hash: &[u8],
        replacement: Replacement,
    ) -> AuthResult<Rotation> {
        run_to_completion(rotate_in_transaction(
            self.pool.clone(),
            presented_hash.to_vec(),
            replacement,
        ))
        .await?
    }

    async fn revoke_refresh_token(&self, token_hash: &[u8]) -> AuthResult<bool> {
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked > 0)
    }

    async fn revoke_token_family(&self, family_id: Uuid) -> AuthResult<u64> {
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE family_id = $1 AND revoked_at IS NULL",
        )
        .bind(family_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }

    async fn revoke_user_tokens(&self, user_id: &UserId) -> AuthResult<u64> {
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id.into_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }
}

// ============================================================================
// Password Reset Repository Implementation
// ============================================================================

impl PasswordResetRepository for PgAuthRepository {
    async fn replace_password_reset(&self, reset: &PasswordReset) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (token_hash, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&reset.token_hash)
        .bind(reset.user_id.into_uuid())
        .bind(reset.expires_at)
        .bind(reset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume_password_reset(&self, token_hash: &[u8]) -> AuthResult<Option<PasswordReset>> {
        let row = sqlx::query_as::<_, PasswordResetRow>(
            r#"
            DELETE FROM password_resets
            WHERE token_hash = $1
            RETURNING token_hash, user_id, expires_at, created_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PasswordResetRow::into_reset))
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    role: String,
    blocked: bool,
    full_name: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role in users row: {}", self.role)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            role,
            blocked: self.blocked,
            full_name: FullName::from_db(self.full_name),
            bio: self.bio,
            avatar_url: self.avatar_url,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: Uuid,
    password_hash: String,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_credential(self) -> AuthResult<Credential> {
        Ok(Credential {
            user_id: UserId::from_uuid(self.user_id),
            password_hash: UserPassword::from_db(self.password_hash)?,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token_id: Uuid,
    family_id: Uuid,
    user_id: Uuid,
    token_hash: Vec<u8>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            token_id: self.token_id,
            family_id: self.family_id,
            user_id: UserId::from_uuid(self.user_id),
            token_hash: self.token_hash,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PasswordResetRow {
    token_hash: Vec<u8>,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl PasswordResetRow {
    fn into_reset(self) -> PasswordReset {
        PasswordReset {
            token_hash: self.token_hash,
            user_id: UserId::from_uuid(self.user_id),
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}
