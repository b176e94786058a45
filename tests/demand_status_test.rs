// ==========================================
// 需求状态机集成测试
// ==========================================
// 覆盖: 状态迁移、日期盖章、团队时效计数器
// ==========================================


use chrono::NaiveDate;
use team_capacity_planner::config::PlanningConfig;
use team_capacity_planner::engine::{
    DemandAllocator, DemandStatusEngine, EngineError, OptionalNotificationSink,
};
use team_capacity_planner::{AllocationMode, DemandStatus};
use test_helpers::{create_test_db, seed_team_with_members};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 仅挂接团队、不走分配器（模拟历史数据或手工归队的需求）
fn attach_team(
    repos: &team_capacity_planner::engine::PlanningRepositories,
    demand_id: i64,
    team_id: i64,
) {
    let mut demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    demand.team_id = Some(team_id);
    repos.demand_repo.update(&demand).unwrap();
}

/// 建一个已分配的需求: 2×8h 团队，40h，起始 2026-03-02，预计完工 2026-03-04
fn setup_assigned_demand(
    repos: &team_capacity_planner::engine::PlanningRepositories,
) -> (i64, i64) {
    let (team_id, _) = seed_team_with_members(repos, "alpha", 2, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(Some("数据迁移"), AllocationMode::Regular).unwrap();
    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    allocator.assign(demand_id, team_id, 40.0, d(2026, 3, 2)).unwrap();
    (demand_id, team_id)
}

#[test]
fn test_pending_to_in_progress_stamps_start_date() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 1, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();
    attach_team(&repos, demand_id, team_id);

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    let demand = engine
        .update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 3))
        .unwrap();

    assert_eq!(demand.completion_status, DemandStatus::InProgress);
    assert_eq!(demand.start_date, Some(d(2026, 3, 3)));

    let persisted = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert_eq!(persisted.completion_status, DemandStatus::InProgress);
    assert_eq!(persisted.start_date, Some(d(2026, 3, 3)));
}

#[test]
fn test_in_progress_requires_assigned_team() {
    let (_tmp, repos) = create_test_db().unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    let err = engine
        .update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 3))
        .unwrap_err();
    assert!(matches!(err, EngineError::NoTeamAssigned { .. }));

    // 拒绝后状态与日期均不变
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert_eq!(demand.completion_status, DemandStatus::Pending);
    assert_eq!(demand.start_date, None);
}

#[test]
fn test_in_progress_keeps_planned_start_date() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (demand_id, _) = setup_assigned_demand(&repos);

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    // 分配时的计划开工日 (2026-03-02) 不被实际开工日覆盖
    let demand = engine
        .update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 3))
        .unwrap();
    assert_eq!(demand.start_date, Some(d(2026, 3, 2)));
}

#[test]
fn test_finish_on_time_increments_counter() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (demand_id, team_id) = setup_assigned_demand(&repos);

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    engine
        .update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 2))
        .unwrap();
    // 实际完工 == 预计完工 (2026-03-04)
    let demand = engine
        .update_status_at(demand_id, DemandStatus::Finished, d(2026, 3, 4))
        .unwrap();

    assert_eq!(demand.completion_status, DemandStatus::Finished);
    assert_eq!(demand.actual_end_date, Some(d(2026, 3, 4)));
    assert!(!demand.assignment_status);

    let team = repos.team_repo.find_by_id(team_id).unwrap().unwrap();
    assert_eq!(team.on_time_completions, 1);
    assert_eq!(team.overdue_demands, 0);
    assert_eq!(team.early_completion, 0);
}

#[test]
fn test_finish_early_and_overdue_counters() {
    let (_tmp, repos) = create_test_db().unwrap();
    let engine_config = PlanningConfig::default();

    // 提前完成
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let allocator = DemandAllocator::new(
        repos.clone(),
        engine_config.clone(),
        OptionalNotificationSink::none(),
    );
    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());

    let early_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();
    allocator.assign(early_id, team_id, 40.0, d(2026, 3, 2)).unwrap();
    engine
        .update_status_at(early_id, DemandStatus::Finished, d(2026, 3, 3))
        .unwrap();

    // 逾期完成
    let late_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();
    allocator.assign(late_id, team_id, 40.0, d(2026, 3, 9)).unwrap();
    engine
        .update_status_at(late_id, DemandStatus::Finished, d(2026, 3, 20))
        .unwrap();

    let team = repos.team_repo.find_by_id(team_id).unwrap().unwrap();
    assert_eq!(team.early_completion, 1);
    assert_eq!(team.overdue_demands, 1);
    assert_eq!(team.on_time_completions, 0);
}

#[test]
fn test_finish_requires_assigned_team() {
    let (_tmp, repos) = create_test_db().unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    let err = engine
        .update_status_at(demand_id, DemandStatus::Finished, d(2026, 3, 4))
        .unwrap_err();
    assert!(matches!(err, EngineError::NoTeamAssigned { .. }));

    // 失败后状态不变
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert_eq!(demand.completion_status, DemandStatus::Pending);
}

#[test]
fn test_finished_is_terminal() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (demand_id, _) = setup_assigned_demand(&repos);

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    engine
        .update_status_at(demand_id, DemandStatus::Finished, d(2026, 3, 4))
        .unwrap();

    for target in [
        DemandStatus::Pending,
        DemandStatus::InProgress,
        DemandStatus::Finished,
    ] {
        let err = engine
            .update_status_at(demand_id, target, d(2026, 3, 5))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStatusTransition { .. }));
    }
}

#[test]
fn test_no_backward_transition() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 1, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();
    attach_team(&repos, demand_id, team_id);

    let engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    engine
        .update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 2))
        .unwrap();

    let err = engine
        .update_status_at(demand_id, DemandStatus::Pending, d(2026, 3, 3))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatusTransition { .. }));
}

#[test]
fn test_concurrent_start_has_single_winner() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (demand_id, _) = setup_assigned_demand(&repos);

    // 两个线程同时开工同一需求: 恰好一个成功，另一个撞到非法迁移
    let mut handles = Vec::new();
    for _ in 0..2 {
        let repos = repos.clone();
        handles.push(std::thread::spawn(move || {
            let engine = DemandStatusEngine::new(repos, OptionalNotificationSink::none());
            engine.update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 2))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(EngineError::InvalidStatusTransition { .. })
    )));

    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert_eq!(demand.completion_status, DemandStatus::InProgress);
}
