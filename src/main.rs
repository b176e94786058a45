// ==========================================
// 团队产能规划系统 - 入口
// ==========================================
// 职责: 初始化日志、打开数据库并打印系统概况
// ==========================================

use team_capacity_planner::config::ConfigManager;
use team_capacity_planner::engine::{OptionalNotificationSink, PlanningRepositories};
use team_capacity_planner::{api::TeamApi, logging, APP_NAME, VERSION};

fn main() -> anyhow::Result<()> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "team_capacity_planner.db".to_string());

    tracing::info!("{} v{} 启动", APP_NAME, VERSION);
    tracing::info!(db_path, "打开数据库");

    let repos = PlanningRepositories::from_db_path(&db_path)?;
    let config = ConfigManager::from_connection(repos.connection()).load()?;

    tracing::info!(
        daily_capacity_cap_hours = config.daily_capacity_cap_hours,
        max_simulation_days = config.max_simulation_days,
        min_request_lead_days = config.min_request_lead_days,
        max_request_span_days = config.max_request_span_days,
        max_team_members = config.max_team_members,
        "规划参数已加载"
    );

    let team_api = TeamApi::new(repos, config, OptionalNotificationSink::none());
    let stats = team_api.list_team_stats()?;
    tracing::info!(team_count = stats.len(), "系统就绪");
    for team in &stats {
        tracing::info!(
            team_id = team.team_id,
            team_name = %team.team_name,
            members = team.member_count,
            on_time = team.on_time_completions,
            overdue = team.overdue_demands,
            early = team.early_completion,
            "团队概况"
        );
    }

    Ok(())
}
