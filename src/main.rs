use usercore::{build_app, init_tracing, serve, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    let addr = state.config.listen_addr()?;
    tracing::info!(
        jwt_expiration_secs = state.config.jwt.expiration_secs,
        "configuration loaded"
    );

    serve(build_app(state), addr).await
}
