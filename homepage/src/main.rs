use homepage::config::Config;
use homepage::create_app;
use homepage::observability::TracingConfig;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    create_app(config.clone())
        .with_tracing(TracingConfig::from_config(&config))
        .listen()
        .await
}
