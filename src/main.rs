use anyhow::Result;
use clap::Parser;
use imagenet_classifier::config::{Config, TensorLayout, DEFAULT_LABELS_URL, DEFAULT_MODEL_LOCATION};
use imagenet_classifier::web::serve;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imagenet-classifier")]
#[command(about = "Top-5 ImageNet classification with a drag-and-drop web UI")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:5006")]
    bind: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Class label list (URL or file path, one name per line)
    #[arg(long, default_value = DEFAULT_LABELS_URL)]
    labels: String,

    /// ONNX model (URL or file path)
    #[arg(long, default_value = DEFAULT_MODEL_LOCATION)]
    model: String,

    /// Input layout the model expects (nchw for channels-first exports)
    #[arg(long, value_enum, default_value_t = TensorLayout::Nhwc)]
    layout: TensorLayout,

    /// ONNX intra-op threads
    #[arg(long)]
    threads: Option<usize>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting ImageNet classifier...");
    tracing::info!("Labels: {}", args.labels);
    tracing::info!("Model: {} ({:?})", args.model, args.layout);

    let config = Config::new(
        args.bind,
        &args.labels,
        &args.model,
        args.layout,
        args.threads,
        args.dev,
    )?;

    serve(config).await?;

    Ok(())
}
