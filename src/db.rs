// ==========================================
// 团队产能规划系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一 schema 建表语句（create-if-absent，测试与生产共用）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等，create-if-absent）
///
/// # 表清单
/// - user / manager / employee: 身份与角色
/// - team: 团队与完成统计计数器
/// - capacity_override: 员工按日产能覆盖（唯一: employee_id + date）
/// - team_daily_schedule: 团队按日产能汇总缓存（唯一: team_id + date）
/// - demand / demand_daily_allocation: 需求与按日分配
/// - capacity_change_request / demand_edit_request: 审批工作流
/// - notification: 通知
/// - config_scope / config_kv: 配置存储
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS user (
            user_id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            full_name TEXT,
            is_manager INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS manager (
            manager_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE REFERENCES user(user_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS team (
            team_id INTEGER PRIMARY KEY AUTOINCREMENT,
            manager_id INTEGER REFERENCES manager(manager_id) ON DELETE SET NULL,
            team_name TEXT NOT NULL,
            on_time_completions INTEGER NOT NULL DEFAULT 0,
            overdue_demands INTEGER NOT NULL DEFAULT 0,
            early_completion INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS employee (
            employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE REFERENCES user(user_id) ON DELETE CASCADE,
            team_id INTEGER REFERENCES team(team_id) ON DELETE SET NULL,
            standard_daily_capacity REAL NOT NULL DEFAULT 8.0
        );

        CREATE TABLE IF NOT EXISTS capacity_override (
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            capacity_hours REAL NOT NULL,
            PRIMARY KEY (employee_id, date)
        );

        CREATE TABLE IF NOT EXISTS team_daily_schedule (
            team_id INTEGER NOT NULL REFERENCES team(team_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            team_capacity REAL NOT NULL DEFAULT 0,
            hours_allocated REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (team_id, date)
        );

        CREATE TABLE IF NOT EXISTS demand (
            demand_id INTEGER PRIMARY KEY AUTOINCREMENT,
            demand_name TEXT,
            team_id INTEGER REFERENCES team(team_id) ON DELETE SET NULL,
            time_needed REAL NOT NULL DEFAULT 0,
            time_completed REAL NOT NULL DEFAULT 0,
            completion_status TEXT NOT NULL DEFAULT 'PENDING',
            assignment_status INTEGER NOT NULL DEFAULT 0,
            start_date TEXT,
            estimated_end_date TEXT,
            actual_end_date TEXT,
            allocation_mode TEXT NOT NULL DEFAULT 'REGULAR'
        );

        CREATE TABLE IF NOT EXISTS demand_daily_allocation (
            demand_id INTEGER NOT NULL REFERENCES demand(demand_id) ON DELETE CASCADE,
            team_id INTEGER NOT NULL REFERENCES team(team_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            hours_allocated REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (demand_id, date)
        );

        CREATE TABLE IF NOT EXISTS capacity_change_request (
            request_id TEXT PRIMARY KEY,
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            new_capacity REAL NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING'
        );

        CREATE TABLE IF NOT EXISTS demand_edit_request (
            request_id TEXT PRIMARY KEY,
            demand_id INTEGER NOT NULL REFERENCES demand(demand_id) ON DELETE CASCADE,
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            new_name TEXT,
            new_status TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING'
        );

        CREATE TABLE IF NOT EXISTS notification (
            notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            message TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}
