// ==========================================
// API 层集成测试
// ==========================================
// 覆盖: 团队成员管理、交期查询、分配通知、角色档案同步、编辑请求审批
// ==========================================


use std::sync::Arc;

use team_capacity_planner::api::{
    ApiError, AssignDemandRequest, CapacityApi, ChangeCapacityRequest, DeadlineQueryRequest,
    DemandApi, TeamApi, UserApi,
};
use team_capacity_planner::config::PlanningConfig;
use team_capacity_planner::engine::{OptionalNotificationSink, RepositoryNotificationSink};
use team_capacity_planner::AllocationMode;
use test_helpers::{create_test_db, seed_employee, seed_team_with_members};

#[test]
fn test_add_member_enforces_team_size_limit() {
    let (_tmp, repos) = create_test_db().unwrap();
    let config = PlanningConfig::default();
    let api = TeamApi::new(repos.clone(), config.clone(), OptionalNotificationSink::none());

    let team_id = api.create_team("alpha", None).unwrap();
    let mut employee_ids = Vec::new();
    for i in 0..7 {
        employee_ids.push(seed_employee(&repos, &format!("worker_{}", i), 8.0).unwrap());
    }

    // 前 6 人入队成功
    for &employee_id in &employee_ids[..6] {
        api.add_member(team_id, employee_id).unwrap();
    }
    assert_eq!(repos.employee_repo.count_by_team(team_id).unwrap(), 6);

    // 第 7 人被拒
    let err = api.add_member(team_id, employee_ids[6]).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    // 已在队成员重复加入为幂等空操作
    api.add_member(team_id, employee_ids[0]).unwrap();
    assert_eq!(repos.employee_repo.count_by_team(team_id).unwrap(), 6);

    // 移出后可再补位
    api.remove_member(team_id, employee_ids[0]).unwrap();
    api.add_member(team_id, employee_ids[6]).unwrap();
    assert_eq!(repos.employee_repo.count_by_team(team_id).unwrap(), 6);
}

#[test]
fn test_get_teams_meeting_deadline() {
    let (_tmp, repos) = create_test_db().unwrap();
    let config = PlanningConfig::default();
    let api = DemandApi::new(repos.clone(), config.clone(), OptionalNotificationSink::none());

    // big: 2×8=16h/日, small: 1×2=2h/日
    let (big_id, _) = seed_team_with_members(&repos, "big", 2, 8.0).unwrap();
    let (small_id, _) = seed_team_with_members(&repos, "small", 1, 2.0).unwrap();

    // 40h 三天内: 仅 big 可达 (16/16/8)
    let qualified = api
        .get_teams_meeting_deadline(DeadlineQueryRequest {
            hours: 40.0,
            start_date: "2026-03-02".to_string(),
            desired_end_date: "2026-03-04".to_string(),
        })
        .unwrap();
    assert_eq!(qualified, vec![big_id]);

    // 4h 两天内: 两队都可达
    let qualified = api
        .get_teams_meeting_deadline(DeadlineQueryRequest {
            hours: 4.0,
            start_date: "2026-03-02".to_string(),
            desired_end_date: "2026-03-03".to_string(),
        })
        .unwrap();
    assert_eq!(qualified, vec![big_id, small_id]);

    // 非法输入
    let err = api
        .get_teams_meeting_deadline(DeadlineQueryRequest {
            hours: -1.0,
            start_date: "2026-03-02".to_string(),
            desired_end_date: "2026-03-04".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api
        .get_teams_meeting_deadline(DeadlineQueryRequest {
            hours: 8.0,
            start_date: "2026-03-05".to_string(),
            desired_end_date: "2026-03-04".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 查询是纯模拟，不产生写入
    assert!(repos.schedule_repo.find(big_id, chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()).unwrap().is_none());
}

#[test]
fn test_assign_demand_notifies_team_members() {
    let (_tmp, repos) = create_test_db().unwrap();
    let config = PlanningConfig::default();
    let sink = OptionalNotificationSink::with_sink(Arc::new(RepositoryNotificationSink::new(
        repos.notification_repo.clone(),
    )));
    let api = DemandApi::new(repos.clone(), config.clone(), sink);

    let (team_id, members) = seed_team_with_members(&repos, "alpha", 2, 8.0).unwrap();
    let demand_id = api.create_demand(Some("压测平台"), AllocationMode::Regular).unwrap();

    let response = api
        .assign_demand(AssignDemandRequest {
            demand_id,
            team_id,
            hours: 20.0,
            start_date: "2026-03-02".to_string(),
        })
        .unwrap();
    assert_eq!(response.estimated_end_date, "2026-03-03");
    assert_eq!(response.daily_allocations.len(), 2);

    // 每名成员都收到通知
    for &employee_id in &members {
        assert_eq!(repos.notification_repo.count_for_employee(employee_id).unwrap(), 1);
        let notifications = repos.notification_repo.list_for_employee(employee_id).unwrap();
        assert!(notifications[0].message.contains("alpha"));
    }
}

#[test]
fn test_change_capacity_api_parses_dates() {
    let (_tmp, repos) = create_test_db().unwrap();
    let config = PlanningConfig::default();
    let api = CapacityApi::new(repos.clone(), config, OptionalNotificationSink::none());

    let (team_id, members) = seed_team_with_members(&repos, "alpha", 1, 8.0).unwrap();

    let err = api
        .change_capacity(ChangeCapacityRequest {
            employee_id: members[0],
            new_capacity: 4.0,
            start_date: "03/10/2026".to_string(),
            end_date: "2026-03-12".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 无任何分配时剩余产能 = 团队总产能
    assert_eq!(api.free_capacity(team_id, "2026-03-10").unwrap(), 8.0);
    assert!(api.free_capacity(team_id, "bad-date").is_err());
}

#[test]
fn test_role_sync_on_user_lifecycle() {
    let (_tmp, repos) = create_test_db().unwrap();
    let api = UserApi::new(repos.clone());

    // 经理用户: 仅持有经理档案
    let manager_user = api.create_user("boss", Some("王经理"), true).unwrap();
    assert!(repos.manager_repo.find_by_user(manager_user).unwrap().is_some());
    assert!(repos.employee_repo.find_by_user(manager_user).unwrap().is_none());

    // 普通用户: 仅持有员工档案（默认 8h）
    let worker_user = api.create_user("dev", None, false).unwrap();
    let employee = repos.employee_repo.find_by_user(worker_user).unwrap().unwrap();
    assert_eq!(employee.standard_daily_capacity, 8.0);
    assert!(repos.manager_repo.find_by_user(worker_user).unwrap().is_none());

    // 降职: 经理档案删除，员工档案建立
    api.set_manager_role(manager_user, false).unwrap();
    assert!(repos.manager_repo.find_by_user(manager_user).unwrap().is_none());
    assert!(repos.employee_repo.find_by_user(manager_user).unwrap().is_some());

    // 升职: 员工档案删除，经理档案建立
    api.set_manager_role(worker_user, true).unwrap();
    assert!(repos.manager_repo.find_by_user(worker_user).unwrap().is_some());
    assert!(repos.employee_repo.find_by_user(worker_user).unwrap().is_none());

    // 不存在的用户
    let err = api.set_manager_role(9999, true).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_demand_edit_request_flow() {
    let (_tmp, repos) = create_test_db().unwrap();
    let config = PlanningConfig::default();
    let api = DemandApi::new(repos.clone(), config, OptionalNotificationSink::none());

    let (_team_id, members) = seed_team_with_members(&repos, "alpha", 1, 8.0).unwrap();
    let demand_id = api.create_demand(Some("旧名称"), AllocationMode::Regular).unwrap();

    // 空请求被拒
    let err = api.submit_edit_request(demand_id, members[0], None, None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 改名请求: 批准后生效并消费请求
    let request_id = api
        .submit_edit_request(demand_id, members[0], Some("新名称".to_string()), None)
        .unwrap();
    assert!(api.handle_edit_request(&request_id, true).unwrap());
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert_eq!(demand.demand_name.as_deref(), Some("新名称"));
    assert!(repos.edit_request_repo.find_by_id(&request_id).unwrap().is_none());

    // 拒绝的请求不生效
    let request_id = api
        .submit_edit_request(demand_id, members[0], Some("另一个名称".to_string()), None)
        .unwrap();
    assert!(api.handle_edit_request(&request_id, false).unwrap());
    let demand = repos.demand_repo.find_by_id(demand_id).unwrap().unwrap();
    assert_eq!(demand.demand_name.as_deref(), Some("新名称"));

    // 不存在的请求
    assert!(!api.handle_edit_request("no-such-request", true).unwrap());
}
