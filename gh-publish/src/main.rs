use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gh_publish::cli::Cli;
use gh_publish::config::Config;
use gh_publish::error::PublishError;
use gh_publish::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    run(&mut cli).await.map_err(report)
}

/// Wrap the failure once; anyhow prints the chain on exit
fn report(err: PublishError) -> anyhow::Error {
    let context = if err.is_usage() {
        "invalid arguments, run with --help for usage"
    } else {
        "publish failed"
    };
    anyhow::Error::new(err).context(context)
}

async fn run(cli: &mut Cli) -> gh_publish::error::Result<()> {
    let config = Config::load(&cli.config)?;
    config.merge_with_cli(cli)?;

    let publish_config = cli.clone().resolve()?;
    let pipeline = Pipeline::new(publish_config).await?;
    pipeline.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_is_reported_once() {
        let err = report(PublishError::InvalidRepo {
            input: "just-a-name".to_string(),
        });
        let rendered = format!("{err:?}");

        assert_eq!(rendered.matches("just-a-name").count(), 1, "{rendered}");
        assert!(rendered.contains("--help"));
    }

    #[test]
    fn test_runtime_error_context() {
        let err = report(PublishError::NoBackend);
        assert_eq!(err.to_string(), "publish failed");
        assert!(format!("{err:?}").contains("gh auth login"));
    }
}
