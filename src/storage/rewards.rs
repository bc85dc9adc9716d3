use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::Result;
use crate::models::RewardRule;

const RULE_COLUMNS: &str = "id, user_id, title, description, category, target_minutes, \
     accumulated_minutes, achieved, achieved_at, redeemed, redeemed_at, created_at";

fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<RewardRule> {
    Ok(RewardRule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        target_minutes: row.get(5)?,
        accumulated_minutes: row.get(6)?,
        achieved: row.get(7)?,
        achieved_at: row.get(8)?,
        redeemed: row.get(9)?,
        redeemed_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl Store {
    pub fn insert_rule(&self, rule: &RewardRule) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO reward_rules (user_id, title, description, category, target_minutes,
                                       accumulated_minutes, achieved, achieved_at, redeemed,
                                       redeemed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                rule.user_id,
                rule.title,
                rule.description,
                rule.category,
                rule.target_minutes,
                rule.accumulated_minutes,
                rule.achieved,
                rule.achieved_at,
                rule.redeemed,
                rule.redeemed_at,
                rule.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn rule(&self, user_id: i64, rule_id: i64) -> Result<Option<RewardRule>> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM reward_rules WHERE id = ?1 AND user_id = ?2");
        Ok(self.conn.query_row(&sql, params![rule_id, user_id], rule_from_row).optional()?)
    }

    pub fn rules_for_user(&self, user_id: i64) -> Result<Vec<RewardRule>> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM reward_rules WHERE user_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], rule_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_rule_progress(
        &self,
        rule_id: i64,
        accumulated_minutes: u32,
        achieved: bool,
        achieved_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE reward_rules SET accumulated_minutes = ?1, achieved = ?2, achieved_at = ?3
             WHERE id = ?4",
            params![accumulated_minutes, achieved, achieved_at, rule_id],
        )?;
        Ok(())
    }

    pub fn mark_rule_redeemed(&self, rule_id: i64, redeemed_at: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE reward_rules SET redeemed = 1, redeemed_at = ?1 WHERE id = ?2",
            params![redeemed_at, rule_id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_rule(&self, user_id: i64, rule_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM reward_rules WHERE id = ?1 AND user_id = ?2",
            params![rule_id, user_id],
        )?;
        Ok(changed > 0)
    }
}
