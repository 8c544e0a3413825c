use tracing::{info, warn};

use super::{
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::{
    error::AppError,
    users::{dto::CreateUserRequest, repo_types::User, services::UserService},
    validate,
};

/// Login, registration and password changes on top of [`UserService`].
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    jwt: JwtKeys,
}

impl AuthService {
    pub fn new(users: UserService, jwt: JwtKeys) -> Self {
        Self { users, jwt }
    }

    /// Unknown email and wrong password both end in `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        let email = validate::required("email", email)?;
        validate::required("password", password)?;

        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.jwt.issue(user.id, &user.email)?;
        info!(user_id = user.id, email = %user.email, "user logged in");
        Ok((user, token))
    }

    /// Creates the account without logging it in.
    pub async fn register(&self, req: CreateUserRequest) -> Result<User, AppError> {
        let user = self.users.create_user(req).await?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Tokens issued before the change stay valid until their own expiry.
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        validate::required("old_password", old_password)?;
        validate::password("new_password", new_password)?;

        let user = self.users.get_user(user_id).await?;
        if !verify_password(old_password, &user.password_hash)? {
            warn!(user_id, "change password: old password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user, password_hash).await?;
        info!(user_id, "password changed");
        Ok(())
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, AppError> {
        self.users.get_user(user_id).await
    }
}
