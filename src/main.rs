use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use truthlens_client::error::login_alert;
use truthlens_client::{
    AnalysisSubmitter, Config, DetectionApi, HttpDetectionApi, MediaFile, NavItem, Navigation,
    SessionStore, StatisticsReconciler, StatsSource,
};

#[derive(Parser)]
#[command(name = "truthlens", about = "TruthLens deepfake detection client")]
struct Cli {
    /// 覆盖 TRUTHLENS_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 上传一个文件做深度伪造检测
    Analyze {
        file: PathBuf,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// 仪表盘统计（非管理员自动降级为自己的上传数）
    Stats {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// 向服务端确认当前登录身份
    Whoami {
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Args)]
struct Credentials {
    #[arg(long, env = "TRUTHLENS_EMAIL")]
    email: Option<String>,
    #[arg(long, env = "TRUTHLENS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ----------------------------------------------------------------
    // 0. 加载配置 & 建立客户端
    // ----------------------------------------------------------------
    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    tracing::info!("⚙️  配置加载完成: API={}, Timeout={:?}", config.api_url, config.timeout);

    let api: Arc<dyn DetectionApi> = Arc::new(HttpDetectionApi::new(config)?);
    let sessions = SessionStore::new(api.clone());

    // ----------------------------------------------------------------
    // 1. 登录（可选）
    // ----------------------------------------------------------------
    let credentials = match &cli.command {
        Command::Analyze { credentials, .. }
        | Command::Stats { credentials }
        | Command::Whoami { credentials } => credentials,
    };
    if credentials.email.is_some() || credentials.password.is_some() {
        let email = credentials.email.as_deref().unwrap_or_default();
        let password = credentials.password.as_deref().unwrap_or_default();
        if let Err(err) = sessions.login(email, password).await {
            eprintln!("{}", login_alert(&err));
            return Ok(ExitCode::FAILURE);
        }
    }

    print_nav(&sessions).await;

    // ----------------------------------------------------------------
    // 2. 执行命令
    // ----------------------------------------------------------------
    let code = match cli.command {
        Command::Analyze { file, .. } => analyze(api, file).await?,
        Command::Stats { .. } => {
            let session = sessions.session().await;
            let view = StatisticsReconciler::new(api).load(&session).await;

            println!("{}", session.greeting());
            println!("  Total uploads : {}", view.total_uploads);
            println!("  Real          : {}", view.real_count);
            println!("  Fake          : {}", view.fake_count);
            println!("  AI-generated  : {}", view.ai_generated_count);
            match view.source {
                StatsSource::Aggregate => {}
                StatsSource::OwnHistory => println!("  (your uploads only; category breakdown unavailable)"),
                StatsSource::Unavailable => println!("  (statistics unavailable)"),
            }
            ExitCode::SUCCESS
        }
        Command::Whoami { .. } => match sessions.refresh_identity().await {
            Ok(profile) => {
                println!("{} <{}> role={}", profile.name, profile.email, profile.role);
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Not logged in ({})", err.kind());
                ExitCode::FAILURE
            }
        },
    };

    sessions.logout().await;
    Ok(code)
}

async fn analyze(api: Arc<dyn DetectionApi>, path: PathBuf) -> anyhow::Result<ExitCode> {
    let file = MediaFile::open(&path).await?;
    let submitter = AnalysisSubmitter::new(api);
    submitter.select_file(file).await;

    match submitter.submit().await {
        Ok(result) => {
            println!("Result     : {}", result.detection_result);
            println!("Confidence : {}", result.confidence_score);
            println!("File name  : {}", result.file_name);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if let Some(alert) = err.alert() {
                eprintln!("{alert}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn print_nav(sessions: &SessionStore) {
    let session = sessions.session().await;
    let labels: Vec<&str> = Navigation::for_session(&session)
        .iter()
        .map(|item| match item {
            NavItem::Link { label, .. } => *label,
            NavItem::Logout => "Logout",
        })
        .collect();
    tracing::debug!("🧭 导航: {}", labels.join(" | "));
}
