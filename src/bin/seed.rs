//! Resets the `users` table to a known demo data set.

use anyhow::Context;
use tracing::{error, info};
use usercore::{
    auth::password::hash_password,
    config::AppConfig,
    db, init_tracing,
    users::{
        repo::{PgUserRepository, UserRepository},
        repo_types::{NewUser, STATUS_ACTIVE},
    },
};

const ADMIN_PASSWORD: &str = "admin123";
const USER_PASSWORD: &str = "password123";

struct Demo {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    age: i32,
}

const DEMO_USERS: &[Demo] = &[
    Demo { name: "System Admin", email: "admin@example.com", phone: "13800138000", age: 35 },
    Demo { name: "Zhang San", email: "zhangsan@example.com", phone: "13800138001", age: 28 },
    Demo { name: "Li Si", email: "lisi@example.com", phone: "13800138002", age: 32 },
    Demo { name: "Wang Wu", email: "wangwu@example.com", phone: "13800138003", age: 25 },
    Demo { name: "Zhao Liu", email: "zhaoliu@example.com", phone: "13800138004", age: 30 },
    Demo { name: "Qian Qi", email: "qianqi@example.com", phone: "13800138005", age: 27 },
    Demo { name: "Sun Ba", email: "sunba@example.com", phone: "13800138006", age: 29 },
    Demo { name: "Zhou Jiu", email: "zhoujiu@example.com", phone: "13800138007", age: 31 },
    Demo { name: "Wu Shi", email: "wushi@example.com", phone: "13800138008", age: 26 },
    Demo { name: "Zheng Shiyi", email: "zhengshiyi@example.com", phone: "13800138009", age: 33 },
    Demo { name: "Wang Shier", email: "wangshier@example.com", phone: "13800138010", age: 24 },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config.database).await?;
    db::migrate(&pool).await;
    let repo = PgUserRepository::new(pool);

    let removed = repo.reset().await.context("clear users table")?;
    info!(removed, "existing users removed");

    // Demo accounts share one hash per password.
    let admin_hash = hash_password(ADMIN_PASSWORD)?;
    let user_hash = hash_password(USER_PASSWORD)?;

    let mut inserted = 0usize;
    for (i, demo) in DEMO_USERS.iter().enumerate() {
        let password_hash = if i == 0 { admin_hash.clone() } else { user_hash.clone() };
        let new_user = NewUser {
            name: demo.name.into(),
            email: demo.email.into(),
            password_hash,
            phone: demo.phone.into(),
            age: demo.age,
            status: STATUS_ACTIVE,
        };
        match repo.create(new_user).await {
            Ok(user) => {
                inserted += 1;
                info!(user_id = user.id, email = %user.email, "seeded");
            }
            Err(e) => error!(error = %e, email = demo.email, "seed insert failed"),
        }
    }

    info!(inserted, total = DEMO_USERS.len(), "seeding finished");
    info!(email = DEMO_USERS[0].email, password = ADMIN_PASSWORD, "admin account");
    info!(password = USER_PASSWORD, "every other demo account uses this password");
    Ok(())
}
