// ==========================================
// 团队产能规划系统 - 分配模拟器
// ==========================================
// 职责: 贪心逐日推演需求分配，纯计算不落库
// 规则: 每日吃掉剩余可分配产能，推进天数超上限判不可行
// ==========================================

use chrono::{Duration, NaiveDate};

use crate::engine::error::EngineResult;

/// 浮点比较容差（小时）
pub const EPSILON: f64 = 1e-9;

/// 团队剩余产能视图
///
/// 模拟器只依赖此 trait，不触达仓储。
/// 生产实现为 TeamCapacityAggregator，测试可用内存 map 替身。
pub trait FreeCapacityView {
    /// 查询团队单日剩余可分配产能（小时，非负）
    fn free_capacity(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64>;
}

/// 单日分配切片
#[derive(Debug, Clone, PartialEq)]
pub struct DailySlice {
    pub date: NaiveDate,
    pub hours: f64,
}

/// 模拟结果
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// 可行: 给出完工日期与逐日切片
    Feasible {
        end_date: NaiveDate,
        slices: Vec<DailySlice>,
    },
    /// 不可行: 推进天数达到上限仍有剩余工时
    Infeasible {
        remaining_hours: f64,
        days_attempted: u32,
    },
}

/// 分配模拟器
///
/// 贪心逐日推演: 从起始日起，每天吃掉该日剩余产能，
/// 直到需求工时耗尽或推进天数达到上限。
/// 无剩余产能的日期照常推进（消耗天数预算）。
pub struct AllocationSimulator {
    max_simulation_days: u32,
}

impl AllocationSimulator {
    /// 创建模拟器
    ///
    /// # 参数
    /// - max_simulation_days: 推进天数上限，超过判不可行
    pub fn new(max_simulation_days: u32) -> Self {
        Self {
            max_simulation_days,
        }
    }

    /// 模拟需求分配
    ///
    /// # 参数
    /// - view: 团队剩余产能视图
    /// - team_id: 候选团队
    /// - start_date: 起始日期（含）
    /// - total_hours: 需求总工时
    ///
    /// # 返回
    /// - Feasible: 完工日期 = 最后一个获得工时的日期；零工时需求完工于起始日
    /// - Infeasible: 窗口内无法排完
    pub fn simulate(
        &self,
        view: &dyn FreeCapacityView,
        team_id: i64,
        start_date: NaiveDate,
        total_hours: f64,
    ) -> EngineResult<SimulationOutcome> {
        if total_hours <= EPSILON {
            return Ok(SimulationOutcome::Feasible {
                end_date: start_date,
                slices: Vec::new(),
            });
        }

        let mut remaining = total_hours;
        let mut current = start_date;
        let mut days_attempted: u32 = 0;
        let mut slices: Vec<DailySlice> = Vec::new();

        while remaining > EPSILON {
            if days_attempted >= self.max_simulation_days {
                return Ok(SimulationOutcome::Infeasible {
                    remaining_hours: remaining,
                    days_attempted,
                });
            }

            let free = view.free_capacity(team_id, current)?;
            let take = free.min(remaining);
            if take > EPSILON {
                slices.push(DailySlice {
                    date: current,
                    hours: take,
                });
                remaining -= take;
            }

            current += Duration::days(1);
            days_attempted += 1;
        }

        // 循环退出时 remaining 已耗尽，最后一个切片即完工日
        let end_date = slices
            .last()
            .map(|s| s.date)
            .unwrap_or(start_date);

        Ok(SimulationOutcome::Feasible { end_date, slices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// 内存产能视图替身: (team_id, date) -> 剩余产能，缺键为 0
    struct MapView {
        free: HashMap<(i64, NaiveDate), f64>,
    }

    impl FreeCapacityView for MapView {
        fn free_capacity(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64> {
            Ok(*self.free.get(&(team_id, date)).unwrap_or(&0.0))
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn uniform_view(team_id: i64, start: NaiveDate, days: u32, per_day: f64) -> MapView {
        let mut free = HashMap::new();
        for i in 0..days {
            free.insert((team_id, start + Duration::days(i as i64)), per_day);
        }
        MapView { free }
    }

    #[test]
    fn test_simulate_spreads_across_days() {
        let start = d(2026, 3, 2);
        let view = uniform_view(1, start, 10, 16.0);
        let sim = AllocationSimulator::new(30);

        let outcome = sim.simulate(&view, 1, start, 40.0).unwrap();
        match outcome {
            SimulationOutcome::Feasible { end_date, slices } => {
                assert_eq!(end_date, d(2026, 3, 4));
                assert_eq!(slices.len(), 3);
                assert_eq!(slices[0].hours, 16.0);
                assert_eq!(slices[1].hours, 16.0);
                assert_eq!(slices[2].hours, 8.0);
            }
            other => panic!("期望 Feasible，实际 {:?}", other),
        }
    }

    #[test]
    fn test_simulate_skips_zero_capacity_days() {
        let start = d(2026, 3, 2);
        let mut view = uniform_view(1, start, 5, 8.0);
        // 第二天无产能
        view.free.insert((1, d(2026, 3, 3)), 0.0);
        let sim = AllocationSimulator::new(30);

        let outcome = sim.simulate(&view, 1, start, 16.0).unwrap();
        match outcome {
            SimulationOutcome::Feasible { end_date, slices } => {
                assert_eq!(end_date, d(2026, 3, 4));
                assert_eq!(slices.len(), 2);
                assert_eq!(slices[0].date, d(2026, 3, 2));
                assert_eq!(slices[1].date, d(2026, 3, 4));
            }
            other => panic!("期望 Feasible，实际 {:?}", other),
        }
    }

    #[test]
    fn test_simulate_infeasible_beyond_cap() {
        let start = d(2026, 3, 2);
        let view = uniform_view(1, start, 60, 1.0);
        let sim = AllocationSimulator::new(30);

        let outcome = sim.simulate(&view, 1, start, 100.0).unwrap();
        match outcome {
            SimulationOutcome::Infeasible {
                remaining_hours,
                days_attempted,
            } => {
                assert_eq!(days_attempted, 30);
                assert!((remaining_hours - 70.0).abs() < 1e-6);
            }
            other => panic!("期望 Infeasible，实际 {:?}", other),
        }
    }

    #[test]
    fn test_simulate_zero_hours_finishes_on_start() {
        let start = d(2026, 3, 2);
        let view = MapView {
            free: HashMap::new(),
        };
        let sim = AllocationSimulator::new(30);

        let outcome = sim.simulate(&view, 1, start, 0.0).unwrap();
        assert_eq!(
            outcome,
            SimulationOutcome::Feasible {
                end_date: start,
                slices: vec![],
            }
        );
    }

    #[test]
    fn test_simulate_exact_fit_single_day() {
        let start = d(2026, 3, 2);
        let view = uniform_view(1, start, 3, 8.0);
        let sim = AllocationSimulator::new(30);

        let outcome = sim.simulate(&view, 1, start, 8.0).unwrap();
        match outcome {
            SimulationOutcome::Feasible { end_date, slices } => {
                assert_eq!(end_date, start);
                assert_eq!(slices.len(), 1);
                assert_eq!(slices[0].hours, 8.0);
            }
            other => panic!("期望 Feasible，实际 {:?}", other),
        }
    }

    #[test]
    fn test_simulate_no_capacity_at_all_infeasible() {
        let start = d(2026, 3, 2);
        let view = MapView {
            free: HashMap::new(),
        };
        let sim = AllocationSimulator::new(5);

        let outcome = sim.simulate(&view, 1, start, 10.0).unwrap();
        match outcome {
            SimulationOutcome::Infeasible {
                remaining_hours,
                days_attempted,
            } => {
                assert_eq!(days_attempted, 5);
                assert_eq!(remaining_hours, 10.0);
            }
            other => panic!("期望 Infeasible，实际 {:?}", other),
        }
    }
}
