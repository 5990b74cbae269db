mod commands;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use provisio_core::ResourceKind;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "provisio", version)]
#[command(about = "クラウドの長時間オペレーションを最後まで見届ける", long_about = None)]
struct Cli {
    /// デバッグログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// オペレーションの完了を待つ
    Wait {
        /// リソース種別 (server, k8s-cluster, request, ...)
        #[arg(short, long)]
        kind: ResourceKind,
        /// オペレーションの Location (リクエストステータスの URL)
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        location: Option<String>,
        /// リソース ID またはパス
        #[arg(long)]
        id: Option<String>,
        /// リソースが消えるまで待つ
        #[arg(long, requires = "id")]
        absent: bool,
        /// タイムアウト秒数 (デフォルトは設定ファイルの default_timeout_secs)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// リソースを削除し、消えるまで待つ
    Delete {
        /// リソース種別
        #[arg(short, long)]
        kind: ResourceKind,
        /// リソース ID またはパス
        #[arg(long)]
        path: String,
        /// タイムアウト秒数
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// 対応しているリソース種別を一覧表示
    Kinds,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let mut filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    if verbose {
        filter = filter.add_directive(tracing::Level::DEBUG.into());
    }

    // stdout は結果表示に使うのでログは stderr へ
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Wait {
            kind,
            location,
            id,
            absent,
            timeout,
        } => {
            let settings = provisio_config::Settings::load()?;
            commands::wait::handle(&settings, kind, location, id, absent, timeout).await
        }
        Commands::Delete {
            kind,
            path,
            timeout,
        } => {
            let settings = provisio_config::Settings::load()?;
            commands::delete::handle(&settings, kind, &path, timeout).await
        }
        // kinds は設定不要
        Commands::Kinds => {
            commands::kinds::handle();
            Ok(ExitCode::SUCCESS)
        }
    }
}
