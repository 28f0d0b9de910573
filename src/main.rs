#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

use std::io::ErrorKind;
use std::path::Path;

use argh::FromArgs;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};
use unified_cache::configuration::{self, Configuration, ObservabilityConfig};
use unified_cache::Scheduler;

mod shell;

const DEFAULT_CONFIG: &str = "config.toml";

fn set_tracing(config: Option<ObservabilityConfig>) -> Result<(), configuration::Error> {
    if let Some(ObservabilityConfig {
        tracing: Some(tracing_config),
    }) = config
    {
        let resource = Resource::builder()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
            .build();
        let otlp_exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&tracing_config.endpoint)
            .with_timeout(std::time::Duration::from_secs(10))
            .build()?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(otlp_exporter)
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource)
            .with_sampler(Sampler::TraceIdRatioBased(tracing_config.sampling_rate))
            .build();

        let tracer = tracer_provider.tracer("cache-shell");
        let _ = global::set_tracer_provider(tracer_provider);
        let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .with(telemetry)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    }
    Ok(())
}

#[derive(FromArgs, PartialEq, Debug)]
/// A line-oriented shell over an in-memory or Redis-backed cache
struct GlobalArguments {
    #[argh(option, short = 'c', default = "String::from(DEFAULT_CONFIG)")]
    /// the path to the configuration file, defaults to `config.toml`
    config: String,
}

fn load_configuration(path: &str) -> Result<Configuration, configuration::Error> {
    match Configuration::load(path) {
        Err(configuration::Error::Io(err))
            if err.kind() == ErrorKind::NotFound && path == DEFAULT_CONFIG =>
        {
            Ok(Configuration::default())
        }
        result => result,
    }
}

fn main() -> Result<(), configuration::Error> {
    let cli_args: GlobalArguments = argh::from_env();

    let config = load_configuration(&cli_args.config)?;

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.global.worker_threads)
        .enable_all()
        .build()?
        .block_on(run(cli_args, config))
}

async fn run(cli_args: GlobalArguments, config: Configuration) -> Result<(), configuration::Error> {
    set_tracing(config.observability.clone())?;

    if !Path::new(&cli_args.config).exists() {
        info!("No configuration file at {}, using defaults", cli_args.config);
    }

    let cache = config.cache.build(Scheduler::current()?).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    shell::run(&cache, stdin, &mut stdout).await?;

    cache.scheduler().shutdown();
    Ok(())
}
