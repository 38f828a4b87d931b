use std::time::Duration;

use clap::Parser;
use keygate_authorizer::{Authorizer, AuthorizerConfig};

#[derive(Debug, Parser)]
struct Opts {
    /// The URL of the issuer's JSON Web Key Set
    #[arg(short, long, env)]
    jwks_url: String,

    /// The `Authorization` header value to check
    #[arg(short, long, env, hide_env_values = true)]
    authorization: Option<String>,

    /// The ARN of the resource being accessed
    #[arg(
        short,
        long,
        env,
        default_value = "arn:aws:execute-api:us-east-1:123456789012:example/prod/GET/"
    )]
    resource_arn: String,

    /// The issuer tokens must name
    #[arg(short, long, env)]
    issuer: Option<String>,

    /// Seconds of clock skew to tolerate
    #[arg(long, env, default_value_t = 0)]
    leeway_secs: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let mut config =
        AuthorizerConfig::new(opts.jwks_url).with_leeway(Duration::from_secs(opts.leeway_secs));
    if let Some(issuer) = opts.issuer {
        config = config.with_issuer(issuer);
    }

    let authorizer = Authorizer::from_config(&config)?;

    match authorizer
        .respond(opts.authorization.as_deref(), &opts.resource_arn)
        .await
    {
        Ok(document) => println!("{}", serde_json::to_string_pretty(&document)?),
        Err(err) => {
            let error: &dyn std::error::Error = &err;
            tracing::warn!(error, "request denied");
            println!("{}", err.denial_message().unwrap_or("denied"));
        }
    }

    Ok(())
}
