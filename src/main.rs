//! palank-agent CLI 진입점

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = palank_agent::cli::Cli::parse();

    // 로깅 초기화 (RUST_LOG 우선, 없으면 warn / --verbose 시 debug)
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // CLI 실행
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(palank_agent::cli::run(cli))
}
