//! Standalone market data collector CLI.

use clap::{Parser, Subcommand, ValueEnum};
use invest_collector::{modules, CollectorConfig};
use invest_core::logging::{init_logging, LogConfig};
use invest_data::storage::checkpoint::list_checkpoints;
use invest_data::{Database, DatabaseConfig, SymbolRegistry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invest-collector")]
#[command(about = "Korean/US market data collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 종목 레지스트리 동기화 (KRX 목록 + 상장/상장폐지 일자 유도)
    SyncSymbols {
        /// 이전 실행의 체크포인트에서 재개
        #[arg(long)]
        resume: bool,

        /// 상장/상장폐지 일자 유도 생략 (목록 반영만)
        #[arg(long)]
        skip_listing_dates: bool,
    },

    /// 일별 시세 수집 (종목별 증분)
    CollectOhlcv {
        /// 특정 종목만 수집 (쉼표로 구분, 예: "005930,000660")
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 전종목 과거 시세 백필 (일자 단위)
    CollectHistory {
        /// 시작 날짜 (YYYYMMDD)
        #[arg(long)]
        from: Option<String>,

        /// 종료 날짜 (YYYYMMDD, 기본: 오늘)
        #[arg(long)]
        to: Option<String>,

        /// 이전 실행의 체크포인트에서 재개
        #[arg(long)]
        resume: bool,
    },

    /// 미국 워치리스트 수집 (Yahoo Finance)
    CollectUs {
        /// 특정 티커만 수집 (쉼표로 구분, 예: "AAPL,MSFT")
        #[arg(long)]
        symbols: Option<String>,
    },

    /// 저장된 데이터를 CSV로 내보내기
    ExportCsv {
        /// 내보낼 대상
        #[arg(long, value_enum)]
        what: ExportTarget,

        /// 종목코드 (prices 내보내기 시 필수)
        #[arg(long)]
        ticker: Option<String>,

        /// 시작 날짜 (YYYYMMDD, prices 내보내기용)
        #[arg(long)]
        from: Option<String>,

        /// 종료 날짜 (YYYYMMDD, prices 내보내기용)
        #[arg(long)]
        to: Option<String>,

        /// 출력 파일 경로
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 레지스트리 통계 및 체크포인트 상태 출력
    Stats,

    /// 전체 워크플로우 실행 (레지스트리 동기화 → 시세 수집)
    RunAll,

    /// 데몬 모드: 주기적으로 전체 워크플로우 실행
    Daemon,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportTarget {
    /// 종목 레지스트리
    Symbols,
    /// 일별 시세 (한 종목)
    Prices,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화 (RUST_LOG가 없으면 --log-level 사용)
    let mut log_config = LogConfig::from_env();
    if std::env::var("RUST_LOG").is_err() {
        log_config.level = format!("invest_collector={0},invest_data={0}", cli.log_level);
    }
    init_logging(log_config)?;

    tracing::info!("Invest Data Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;

    // DB 연결 및 마이그레이션
    let db = Database::connect(&DatabaseConfig::from_url(&config.database_url)).await?;
    db.migrate().await?;
    let pool = db.pool().clone();

    // 명령 실행
    match cli.command {
        Commands::SyncSymbols {
            resume,
            skip_listing_dates,
        } => {
            let stats = modules::sync_symbols(&pool, &config, resume, skip_listing_dates).await?;
            stats.log_summary("레지스트리 동기화");
        }
        Commands::CollectOhlcv { symbols } => {
            let stats = modules::collect_ohlcv(&pool, &config, symbols).await?;
            stats.log_summary("일별 시세 수집");
        }
        Commands::CollectHistory { from, to, resume } => {
            let stats = modules::collect_history(&pool, &config, from, to, resume).await?;
            stats.log_summary("과거 시세 백필");
        }
        Commands::CollectUs { symbols } => {
            let stats = modules::collect_us(&pool, &config, symbols).await?;
            stats.log_summary("미국 워치리스트 수집");
        }
        Commands::ExportCsv {
            what,
            ticker,
            from,
            to,
            output,
        } => match what {
            ExportTarget::Symbols => {
                let path = output.unwrap_or_else(|| PathBuf::from("exports/symbols.csv"));
                let count = modules::export_symbols(&pool, &path).await?;
                tracing::info!(path = %path.display(), rows = count, "내보내기 완료");
            }
            ExportTarget::Prices => {
                let ticker = ticker.ok_or("--ticker가 필요합니다 (prices 내보내기)")?;
                let range = match (from, to) {
                    (Some(f), Some(t)) => Some((
                        modules::symbol_sync::parse_yyyymmdd(&f)?,
                        modules::symbol_sync::parse_yyyymmdd(&t)?,
                    )),
                    (None, None) => None,
                    _ => return Err("--from과 --to는 함께 지정해야 합니다".into()),
                };
                let path = output
                    .unwrap_or_else(|| PathBuf::from(format!("exports/prices_{}.csv", ticker)));
                let count = modules::export_prices(&pool, &ticker, range, &path).await?;
                tracing::info!(path = %path.display(), rows = count, "내보내기 완료");
            }
        },
        Commands::Stats => {
            print_stats(&pool).await?;
        }
        Commands::RunAll => {
            run_all(&pool, &config).await;
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        run_all(&pool, &config).await;
                        tracing::info!(
                            "=== 워크플로우 완료, 다음 실행: {}분 후 ===",
                            config.daemon.interval_minutes
                        );
                    }
                }
            }
        }
    }

    db.close().await;
    tracing::info!("Invest Data Collector 종료");

    Ok(())
}

/// 전체 워크플로우 실행 (단계별 실패는 로그만 남기고 계속).
async fn run_all(pool: &sqlx::PgPool, config: &CollectorConfig) {
    tracing::info!("=== 전체 워크플로우 시작 ===");

    tracing::info!("Step 1/2: 레지스트리 동기화");
    match modules::sync_symbols(pool, config, true, false).await {
        Ok(stats) => stats.log_summary("레지스트리 동기화"),
        Err(e) => tracing::error!("레지스트리 동기화 실패: {}", e),
    }

    tracing::info!("Step 2/2: 일별 시세 수집");
    match modules::collect_ohlcv(pool, config, None).await {
        Ok(stats) => stats.log_summary("일별 시세 수집"),
        Err(e) => tracing::error!("일별 시세 수집 실패: {}", e),
    }

    tracing::info!("=== 전체 워크플로우 완료 ===");
}

/// 레지스트리 통계와 체크포인트 상태 출력.
async fn print_stats(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = SymbolRegistry::new(pool.clone());
    let stats = registry.stats().await?;

    println!("=== 종목 레지스트리 ===");
    println!("전체:          {}", stats.total);
    println!("  KOSPI:       {}", stats.kospi);
    println!("  KOSDAQ:      {}", stats.kosdaq);
    println!("  US:          {}", stats.us);
    println!("활성:          {}", stats.active);
    println!("상장폐지:      {}", stats.delisted);
    println!("상장일 보유:   {}", stats.with_ipo_date);
    if let (Some(earliest), Some(latest)) = (stats.earliest_ipo, stats.latest_ipo) {
        println!("상장일 범위:   {} ~ {}", earliest, latest);
    }

    let checkpoints = list_checkpoints(pool).await?;
    if !checkpoints.is_empty() {
        println!();
        println!("=== 체크포인트 ===");
        for cp in checkpoints {
            println!(
                "{:<16} {:<12} position={:<10} processed={}",
                cp.workflow_name,
                cp.status,
                cp.last_position.as_deref().unwrap_or("-"),
                cp.total_processed
            );
        }
    }

    Ok(())
}
