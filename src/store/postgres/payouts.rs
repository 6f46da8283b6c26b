use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::earnings::{
    EarningStatus, PayoutError, PayoutStatus, TeacherEarning, TeacherPayout,
};
use edulife_models::ids::{EarningId, PayoutId, UserId};

use super::{storage_error, PostgresStore};
use crate::store::ports::PayoutStore;

fn payout_storage(e: sqlx::Error) -> PayoutError {
    PayoutError::Storage(storage_error(e))
}

#[async_trait]
impl PayoutStore for PostgresStore {
    async fn insert_earning(&self, earning: TeacherEarning) -> Result<TeacherEarning, AppError> {
        sqlx::query_as::<_, TeacherEarning>(
            r#"
            INSERT INTO teacher_earnings
                (id, teacher_id, kind, course_id, period, payment_id,
                 gross_amount, net_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(earning.id)
        .bind(earning.teacher_id)
        .bind(earning.kind)
        .bind(earning.course_id)
        .bind(earning.period)
        .bind(earning.payment_id)
        .bind(earning.gross_amount)
        .bind(earning.net_amount)
        .bind(earning.status)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_earnings(&self, ids: &[EarningId]) -> Result<Vec<TeacherEarning>, AppError> {
        let raw_ids: Vec<uuid::Uuid> = ids.iter().map(|id| id.0).collect();
        sqlx::query_as::<_, TeacherEarning>(
            "SELECT * FROM teacher_earnings WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn list_pending_earnings(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<TeacherEarning>, AppError> {
        sqlx::query_as::<_, TeacherEarning>(
            r#"
            SELECT * FROM teacher_earnings
            WHERE teacher_id = $1 AND status = 'pending' AND payout_id IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(teacher_id)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn create_payout(
        &self,
        payout: TeacherPayout,
        earning_ids: &[EarningId],
    ) -> Result<TeacherPayout, PayoutError> {
        let mut tx = self.pool().begin().await.map_err(payout_storage)?;
        let raw_ids: Vec<uuid::Uuid> = earning_ids.iter().map(|id| id.0).collect();

        let earnings = sqlx::query_as::<_, TeacherEarning>(
            "SELECT * FROM teacher_earnings WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(&raw_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(payout_storage)?;
        if earnings.len() != earning_ids.len() {
            return Err(PayoutError::EarningNotFound);
        }
        for earning in &earnings {
            if earning.status != EarningStatus::Pending || earning.payout_id.is_some() {
                return Err(PayoutError::EarningAlreadyPaid);
            }
            if earning.teacher_id != payout.teacher_id {
                return Err(PayoutError::MixedTeachers);
            }
        }

        let inserted = sqlx::query_as::<_, TeacherPayout>(
            r#"
            INSERT INTO teacher_payouts
                (id, teacher_id, gross_amount, deductions, net_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(payout.id)
        .bind(payout.teacher_id)
        .bind(payout.gross_amount)
        .bind(payout.deductions)
        .bind(payout.net_amount)
        .bind(payout.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(payout_storage)?;

        // Reserve only: the paid transition happens at payout completion.
        sqlx::query(
            r#"
            UPDATE teacher_earnings
            SET payout_id = $2, updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(&raw_ids)
        .bind(inserted.id)
        .execute(&mut *tx)
        .await
        .map_err(payout_storage)?;

        tx.commit().await.map_err(payout_storage)?;
        Ok(inserted)
    }

    async fn find_payout(&self, id: PayoutId) -> Result<Option<TeacherPayout>, AppError> {
        sqlx::query_as::<_, TeacherPayout>("SELECT * FROM teacher_payouts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn complete_payout(
        &self,
        id: PayoutId,
        bank_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<TeacherPayout, PayoutError> {
        let mut tx = self.pool().begin().await.map_err(payout_storage)?;

        let payout = sqlx::query_as::<_, TeacherPayout>(
            r#"
            UPDATE teacher_payouts
            SET status = $2, bank_reference = $3, completed_at = $4, updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(PayoutStatus::Completed)
        .bind(bank_reference)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(payout_storage)?
        .ok_or(PayoutError::PayoutNotFound)?;

        sqlx::query(
            r#"
            UPDATE teacher_earnings
            SET status = 'paid', updated_at = $2
            WHERE payout_id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(payout_storage)?;

        tx.commit().await.map_err(payout_storage)?;
        Ok(payout)
    }
}
