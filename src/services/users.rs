//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::{AuthConfig, UsersConfig},
    error::{AppError, AppResult},
    models::user::{
        CreateUser, RegisterUser, Role, UpdateProfile, UpdateUser, User, UserClaims, UserQuery,
    },
    repository::Repository,
};

/// Role given to a brand-new identity: student, unless the email matches
/// the configured administrator address.
pub fn role_for_new_identity(email: &str, admin_email: &str) -> Role {
    if email.eq_ignore_ascii_case(admin_email) {
        Role::Admin
    } else {
        Role::Student
    }
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    auth: AuthConfig,
    users: UsersConfig,
}

impl UsersService {
    pub fn new(repository: Repository, auth: AuthConfig, users: UsersConfig) -> Self {
        Self {
            repository,
            auth,
            users,
        }
    }

    /// Register a new identity: provisions the profile on first contact.
    /// Returns the session token together with the created profile.
    pub async fn register(&self, request: RegisterUser) -> AppResult<(String, User)> {
        if self.repository.users.email_exists(&request.email, None).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let role = role_for_new_identity(&request.email, &self.users.admin_email);
        let password_hash = self.hash_password(&request.password)?;

        let create = CreateUser {
            email: request.email,
            password: None,
            display_name: request.display_name,
            role: None,
            avatar_url: request.avatar_url,
            department: request.department,
            course: request.course,
            semester: request.semester,
        };

        let user = self
            .repository
            .users
            .create(&create, role, Some(password_hash))
            .await?;

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Authenticate by email and password, returning a JWT token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    /// Create JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.auth.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.auth.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if let Some(ref hash) = user.password {
            let parsed_hash = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(false)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Create a new user (staff action). The role defaults through the
    /// same provisioning rule as self-registration.
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        if self.repository.users.email_exists(&user.email, None).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let role = user
            .role
            .unwrap_or_else(|| role_for_new_identity(&user.email, &self.users.admin_email));

        let password_hash = match user.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        self.repository.users.create(&user, role, password_hash).await
    }

    /// Update an existing user (staff action)
    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        self.repository.users.get_by_id(id).await?;

        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("Email is already registered".to_string()));
            }
        }

        let password_hash = match user.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        self.repository.users.update(id, &user, password_hash).await
    }

    /// Update a user's own profile
    pub async fn update_profile(&self, user_id: i32, profile: UpdateProfile) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;

        // Changing the password requires proving the current one
        if profile.new_password.is_some() {
            let current_password = profile.current_password.as_ref().ok_or_else(|| {
                AppError::Validation("Current password required to change password".to_string())
            })?;

            if !self.verify_password(&user, current_password)? {
                return Err(AppError::Authentication(
                    "Current password is incorrect".to_string(),
                ));
            }
        }

        let password_hash = match profile.new_password {
            Some(ref new_password) => Some(self.hash_password(new_password)?),
            None => None,
        };

        self.repository
            .users
            .update_profile(user_id, &profile, password_hash)
            .await
    }

    /// Update a user's role (admin only)
    pub async fn update_role(&self, user_id: i32, role: Role) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.users.update_role(user_id, role).await
    }

    /// Delete a user (explicit admin action)
    pub async fn delete_user(&self, id: i32, force: bool) -> AppResult<()> {
        self.repository.users.delete(id, force).await
    }

    /// Count all users
    pub async fn count(&self) -> AppResult<i64> {
        self.repository.users.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identity_defaults_to_student() {
        assert_eq!(
            role_for_new_identity("alice@campus.edu", "admin@shelfmark.org"),
            Role::Student
        );
    }

    #[test]
    fn admin_email_is_provisioned_as_admin() {
        assert_eq!(
            role_for_new_identity("admin@shelfmark.org", "admin@shelfmark.org"),
            Role::Admin
        );
        // Email comparison is case-insensitive
        assert_eq!(
            role_for_new_identity("Admin@Shelfmark.org", "admin@shelfmark.org"),
            Role::Admin
        );
    }
}
