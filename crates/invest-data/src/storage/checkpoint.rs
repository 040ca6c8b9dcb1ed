//! 워크플로우 체크포인트 저장소.
//!
//! 장시간 실행되는 배치 작업의 중단/재개를 지원합니다.
//!
//! # 사용 예
//!
//! ```rust,ignore
//! // 워크플로우 시작 시
//! let resume_from = load_checkpoint(pool, "symbol_sync").await?;
//!
//! // 처리 중 (N개마다)
//! save_checkpoint(pool, "symbol_sync", ticker, processed, CheckpointStatus::Running).await?;
//!
//! // 완료 시
//! save_checkpoint(pool, "symbol_sync", "", total, CheckpointStatus::Completed).await?;
//! ```

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::error::Result;

/// 체크포인트 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    /// 실행 중
    Running,
    /// 중단됨 (재개 가능)
    Interrupted,
    /// 완료됨
    Completed,
    /// 유휴 상태
    Idle,
}

impl CheckpointStatus {
    /// 문자열로 변환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Interrupted => "interrupted",
            Self::Completed => "completed",
            Self::Idle => "idle",
        }
    }
}

/// 체크포인트 정보.
#[derive(Debug)]
pub struct CheckpointInfo {
    pub workflow_name: String,
    pub last_position: Option<String>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub total_processed: i32,
    pub status: String,
}

/// 체크포인트 저장.
///
/// # Arguments
/// * `workflow` - 워크플로우 이름 (예: "symbol_sync", "market_history")
/// * `position` - 마지막 처리 위치 (티커 또는 YYYYMMDD, 완료 시 빈 문자열)
/// * `total_processed` - 총 처리된 수
pub async fn save_checkpoint(
    pool: &PgPool,
    workflow: &str,
    position: &str,
    total_processed: i32,
    status: CheckpointStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sync_checkpoint (workflow_name, last_position, last_processed_at, total_processed, status, updated_at)
        VALUES ($1, $2, NOW(), $3, $4, NOW())
        ON CONFLICT (workflow_name)
        DO UPDATE SET
            last_position = EXCLUDED.last_position,
            last_processed_at = NOW(),
            total_processed = EXCLUDED.total_processed,
            status = EXCLUDED.status,
            updated_at = NOW()
        "#,
    )
    .bind(workflow)
    .bind(position)
    .bind(total_processed)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// 체크포인트 로드 (중단된 워크플로우의 마지막 위치 반환).
///
/// `running` 상태도 재개 대상입니다. 프로세스가 강제 종료되면
/// 상태 갱신 없이 `running`으로 남기 때문입니다.
///
/// # Returns
/// * `Some(position)` - 중단된 지점의 마지막 위치
/// * `None` - 중단점이 없거나 완료된 상태
pub async fn load_checkpoint(pool: &PgPool, workflow: &str) -> Result<Option<String>> {
    let result: Option<(Option<String>,)> = sqlx::query_as(
        r#"
        SELECT last_position
        FROM sync_checkpoint
        WHERE workflow_name = $1 AND status IN ('interrupted', 'running')
        "#,
    )
    .bind(workflow)
    .fetch_optional(pool)
    .await?;

    Ok(result.and_then(|(p,)| p).filter(|p| !p.is_empty()))
}

/// 현재 실행 중인 워크플로우를 "interrupted"로 마킹.
///
/// 프로세스 종료 시 호출하여 다음 실행에서 재개 가능하도록 합니다.
pub async fn mark_interrupted(pool: &PgPool, workflow: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sync_checkpoint
        SET status = 'interrupted', updated_at = NOW()
        WHERE workflow_name = $1 AND status = 'running'
        "#,
    )
    .bind(workflow)
    .execute(pool)
    .await?;
    Ok(())
}

/// 워크플로우 체크포인트 삭제 (완전 초기화).
pub async fn clear_checkpoint(pool: &PgPool, workflow: &str) -> Result<()> {
    sqlx::query("DELETE FROM sync_checkpoint WHERE workflow_name = $1")
        .bind(workflow)
        .execute(pool)
        .await?;
    Ok(())
}

/// 모든 워크플로우의 체크포인트 상태 조회.
pub async fn list_checkpoints(pool: &PgPool) -> Result<Vec<CheckpointInfo>> {
    let rows: Vec<(String, Option<String>, Option<DateTime<Utc>>, i32, String)> = sqlx::query_as(
        r#"
        SELECT workflow_name, last_position, last_processed_at, total_processed, status
        FROM sync_checkpoint
        ORDER BY workflow_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(workflow_name, last_position, last_processed_at, total_processed, status)| {
                CheckpointInfo {
                    workflow_name,
                    last_position,
                    last_processed_at,
                    total_processed,
                    status,
                }
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(CheckpointStatus::Running.as_str(), "running");
        assert_eq!(CheckpointStatus::Interrupted.as_str(), "interrupted");
        assert_eq!(CheckpointStatus::Completed.as_str(), "completed");
        assert_eq!(CheckpointStatus::Idle.as_str(), "idle");
    }
}
