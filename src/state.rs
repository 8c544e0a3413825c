use std::sync::Arc;

use crate::{
    auth::{jwt::JwtKeys, services::AuthService},
    config::AppConfig,
    db,
    users::{
        repo::{PgUserRepository, UserRepository},
        services::UserService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: UserService,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await;

        let repo = Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>;
        Ok(Self::from_parts(config, repo))
    }

    pub fn from_parts(config: Arc<AppConfig>, repo: Arc<dyn UserRepository>) -> Self {
        let jwt = JwtKeys::new(&config.jwt);
        let users = UserService::new(repo);
        let auth = AuthService::new(users.clone(), jwt.clone());
        Self {
            config,
            jwt,
            users,
            auth,
        }
    }

    /// State over an in-memory repository, for handler tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{DatabaseConfig, JwtConfig};
        use crate::users::memory::MemoryUserRepository;

        let config = Arc::new(AppConfig {
            server_host: "127.0.0.1".into(),
            server_port: 0,
            database: DatabaseConfig {
                host: "localhost".into(),
                port: 5432,
                user: "postgres".into(),
                password: String::new(),
                name: "test".into(),
                max_connections: 1,
                url: None,
            },
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                expiration_secs: 300,
            },
        });
        Self::from_parts(config, Arc::new(MemoryUserRepository::new()))
    }
}
