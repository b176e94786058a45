// ==========================================
// 需求分配引擎集成测试
// ==========================================
// 覆盖: 逐日分摊、原子性、前置校验、汇总刷新一致性
// ==========================================


use chrono::NaiveDate;
use team_capacity_planner::config::PlanningConfig;
use team_capacity_planner::engine::{
    DemandAllocator, DemandStatusEngine, EngineError, FreeCapacityView, OptionalNotificationSink,
    TeamCapacityAggregator,
};
use team_capacity_planner::AllocationMode;
use team_capacity_planner::DemandStatus;
use test_helpers::{create_test_db, seed_team_with_members};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_assign_spreads_hours_across_days() {
    let (_tmp, repos) = create_test_db().unwrap();
    // 2 名成员 × 8h = 团队 16h/日
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(Some("接口联调"), AllocationMode::Regular).unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    let result = allocator.assign(demand_id, team_id, 40.0, d(2026, 3, 2)).unwrap();

    // 40h 按 16/16/8 分摊，预计完工第三天
    assert_eq!(result.estimated_end_date, d(2026, 3, 4));
    assert_eq!(result.slices.len(), 3);
    assert_eq!(result.slices[0].hours, 16.0);
    assert_eq!(result.slices[1].hours, 16.0);
    assert_eq!(result.slices[2].hours, 8.0);

    // 需求字段已更新
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert!(demand.assignment_status);
    assert_eq!(demand.team_id, Some(team_id));
    assert_eq!(demand.time_needed, 40.0);
    assert_eq!(demand.start_date, Some(d(2026, 3, 2)));
    assert_eq!(demand.estimated_end_date, Some(d(2026, 3, 4)));

    // 物化汇总行已刷新，且不超产能
    for offset in 0..3u32 {
        let date = d(2026, 3, 2 + offset);
        let row = repos.schedule_repo.find(team_id, date).unwrap().unwrap();
        assert_eq!(row.team_capacity, 16.0);
        assert!(row.hours_allocated <= row.team_capacity);
    }
    let last = repos.schedule_repo.find(team_id, d(2026, 3, 4)).unwrap().unwrap();
    assert_eq!(last.hours_allocated, 8.0);
}

#[test]
fn test_assign_rejects_double_assignment() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    allocator.assign(demand_id, team_id, 8.0, d(2026, 3, 2)).unwrap();

    let err = allocator.assign(demand_id, team_id, 8.0, d(2026, 3, 9)).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyAssigned { .. }));
}

#[test]
fn test_assign_rejects_non_pending_demand() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 1, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    // 先挂接团队并转为 InProgress
    let mut demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    demand.team_id = Some(team_id);
    repos.demand_repo.update(&demand).unwrap();
    let status_engine = DemandStatusEngine::new(repos.clone(), OptionalNotificationSink::none());
    status_engine
        .update_status_at(demand_id, DemandStatus::InProgress, d(2026, 3, 1))
        .unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    let err = allocator.assign(demand_id, team_id, 8.0, d(2026, 3, 2)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[test]
fn test_assign_rejects_invalid_hours_and_missing_team() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 1, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );

    let err = allocator.assign(demand_id, team_id, 0.0, d(2026, 3, 2)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidHours { .. }));

    let err = allocator.assign(demand_id, 9999, 8.0, d(2026, 3, 2)).unwrap_err();
    assert!(matches!(err, EngineError::TeamNotFound { team_id: 9999 }));
}

#[test]
fn test_assign_infeasible_leaves_database_untouched() {
    let (_tmp, repos) = create_test_db().unwrap();
    // 1 名成员 1h/日，30 天窗口最多排 30h
    let (team_id, _) = seed_team_with_members(&repos, "tiny", 1, 1.0).unwrap();
    let demand_id = repos.demand_repo.insert(Some("超载需求"), AllocationMode::Regular).unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    let err = allocator.assign(demand_id, team_id, 100.0, d(2026, 3, 2)).unwrap_err();
    match err {
        EngineError::CapacityExceeded {
            remaining_hours,
            days_attempted,
            ..
        } => {
            assert_eq!(days_attempted, 30);
            assert!((remaining_hours - 70.0).abs() < 1e-6);
        }
        other => panic!("期望 CapacityExceeded，实际 {:?}", other),
    }

    // 全量回滚: 无分配行，需求保持未分配
    assert_eq!(repos.allocation_repo.count_for_demand(demand_id).unwrap(), 0);
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert!(!demand.assignment_status);
    assert_eq!(demand.team_id, None);
    assert_eq!(demand.start_date, None);
    assert_eq!(demand.estimated_end_date, None);
}

#[test]
fn test_concurrent_assign_has_single_winner() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    // 两个线程同时分配同一需求: 恰好一个成功，另一个拿到 AlreadyAssigned
    let mut handles = Vec::new();
    for _ in 0..2 {
        let repos = repos.clone();
        handles.push(std::thread::spawn(move || {
            let allocator = DemandAllocator::new(
                repos,
                PlanningConfig::default(),
                OptionalNotificationSink::none(),
            );
            allocator.assign(demand_id, team_id, 16.0, d(2026, 3, 2))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(EngineError::AlreadyAssigned { .. }))));

    // 落库结果与单次分配一致
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert!(demand.assignment_status);
    assert_eq!(demand.time_needed, 16.0);
    assert_eq!(repos.allocation_repo.sum_for_demand(demand_id).unwrap(), 16.0);
}

#[test]
fn test_free_capacity_matches_base_table_recompute() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    allocator.assign(demand_id, team_id, 20.0, d(2026, 3, 2)).unwrap();

    let aggregator = TeamCapacityAggregator::new(repos.clone());
    for offset in 0..3u32 {
        let date = d(2026, 3, 2 + offset);
        let cached = aggregator.free_capacity(team_id, date).unwrap();
        let raw_total = 16.0;
        let raw_committed = repos.allocation_repo.sum_for_team_date(team_id, date).unwrap();
        assert!((cached - (raw_total - raw_committed).max(0.0)).abs() < 1e-9);
    }

    // 无缓存行的未来日期回退基础表口径
    let future = d(2026, 4, 1);
    assert!(repos.schedule_repo.find(team_id, future).unwrap().is_none());
    assert_eq!(aggregator.free_capacity(team_id, future).unwrap(), 16.0);
}

#[test]
fn test_release_returns_demand_to_unassigned() {
    let (_tmp, repos) = create_test_db().unwrap();
    let (team_id, _) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let demand_id = repos.demand_repo.insert(None, AllocationMode::Regular).unwrap();

    let allocator = DemandAllocator::new(
        repos.clone(),
        PlanningConfig::default(),
        OptionalNotificationSink::none(),
    );
    allocator.assign(demand_id, team_id, 24.0, d(2026, 3, 2)).unwrap();
    assert!(repos.allocation_repo.count_for_demand(demand_id).unwrap() > 0);

    allocator.release(demand_id).unwrap();

    assert_eq!(repos.allocation_repo.count_for_demand(demand_id).unwrap(), 0);
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert!(!demand.assignment_status);
    assert_eq!(demand.team_id, None);

    // 汇总行回到零占用
    let aggregator = TeamCapacityAggregator::new(repos.clone());
    assert_eq!(aggregator.hours_committed(team_id, d(2026, 3, 2)).unwrap(), 0.0);
    assert_eq!(aggregator.free_capacity(team_id, d(2026, 3, 2)).unwrap(), 16.0);
}
