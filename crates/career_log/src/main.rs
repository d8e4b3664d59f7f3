use career_log::{config, server, state::AppContext};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_tracing();
    let config = config::AppConfig::load()?;
    info!(logs_dir = %config.logs_dir.display(), "starting career log service");
    let ctx = AppContext::from_app_config(config)?;

    let server_ctx = ctx.clone();
    let server_task = tokio::spawn(async move {
        if let Err(err) = server::serve(server_ctx).await {
            error!(error = ?err, "server error");
        }
    });

    tokio::signal::ctrl_c().await?;
    ctx.request_shutdown();

    let _ = server_task.await;

    Ok(())
}
