use skyreport_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (staging, services, routes)
    let (_state, router) = skyreport_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    skyreport_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
