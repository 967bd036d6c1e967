use env_logger::Env;
use log::error;
use profile_stats::config::Config;
use profile_stats::github::GithubClient;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match update_cards().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn update_cards() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let client = GithubClient::new(&config)?;
    profile_stats::run(&config, &client).await?;
    Ok(())
}
