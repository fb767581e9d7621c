use anyhow::Context;
use chrono::{Duration, Utc};
use log::{debug, info};
use sqlx::{PgExecutor, PgPool, Row};

use crate::export;
use crate::models::{
    AnswerField, AnswerSet, ConditionalField, NewSubmission, Submission, SubmissionInput,
};
use crate::questions::PollDefinition;
use crate::submission::validate_submission;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn insert_sql() -> String {
    let mut columns = vec!["email"];
    columns.extend(AnswerField::ALL.iter().map(|field| field.column()));
    columns.extend(ConditionalField::ALL.iter().map(|field| field.column()));

    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
    let created_at = columns.len() + 1;

    format!(
        "INSERT INTO community_poll.submissions ({}, created_at) \
         VALUES ({}, COALESCE(${created_at}, NOW())) \
         RETURNING id",
        columns.join(", "),
        placeholders.join(", "),
    )
}

pub async fn insert_submission<'e, E>(
    executor: E,
    submission: &NewSubmission,
) -> anyhow::Result<i32>
where
    E: PgExecutor<'e>,
{
    let sql = insert_sql();
    let mut query = sqlx::query(&sql).bind(submission.email.as_deref());
    for field in AnswerField::ALL {
        query = query.bind(submission.answers.answer(field));
    }
    for field in ConditionalField::ALL {
        query = query.bind(submission.answers.conditional(field));
    }
    let id: i32 = query
        .bind(submission.created_at)
        .fetch_one(executor)
        .await?
        .get("id");
    Ok(id)
}

pub async fn fetch_submissions(pool: &PgPool) -> anyhow::Result<Vec<Submission>> {
    let records = sqlx::query(
        "SELECT * FROM community_poll.submissions ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut submissions = Vec::with_capacity(records.len());
    for row in records {
        let mut answers = AnswerSet::default();
        for field in AnswerField::ALL {
            answers.answers[field.index()] = row.try_get(field.column())?;
        }
        for field in ConditionalField::ALL {
            answers.set_conditional(field, row.try_get(field.column())?);
        }

        submissions.push(Submission {
            id: row.get("id"),
            email: row.get("email"),
            answers,
            created_at: row.get("created_at"),
        });
    }

    debug!("fetched {} submissions", submissions.len());
    Ok(submissions)
}

pub async fn count_submissions(pool: &PgPool) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM community_poll.submissions")
        .fetch_one(pool)
        .await?
        .get("count");
    Ok(count)
}

pub async fn clear_all(pool: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM community_poll.submissions")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

fn seed_inputs() -> Vec<(SubmissionInput, i64)> {
    fn answers(email: &str, picks: &[(AnswerField, &str)]) -> SubmissionInput {
        let mut input = SubmissionInput {
            email: Some(email.to_string()),
            ..SubmissionInput::default()
        };
        for (field, value) in picks {
            *input.answer_mut(*field) = Some(value.to_string());
        }
        input
    }

    let mut children = answers(
        "harper.quinn@community.example",
        &[
            (AnswerField::Q0, "Social Connector"),
            (AnswerField::Q1, "Bring Guests"),
            (AnswerField::Q7, "Young Family"),
            (AnswerField::Q9, "Yes"),
            (AnswerField::Q14, "Yoga / Pilates,Walking Club"),
            (AnswerField::Q16, "Family Events,Holiday Events,Outdoor Events"),
            (AnswerField::Q20, "Community App"),
        ],
    );
    children.q9_ages = Some("3, 6".to_string());

    let mut pets = answers(
        "ellis.navarro@community.example",
        &[
            (AnswerField::Q0, "Wellness Focused"),
            (AnswerField::Q1, "Like Small Groups"),
            (AnswerField::Q10, "50–59"),
            (AnswerField::Q14, "Meditation,Mobility"),
            (AnswerField::Q18, "Other"),
            (AnswerField::Q19, "Gardening,Reading"),
            (AnswerField::Q20, "Email"),
        ],
    );
    pets.q18_other = Some("Chickens".to_string());

    let retiree = answers(
        "morgan.reyes@community.example",
        &[
            (AnswerField::Q0, "Social Connector"),
            (AnswerField::Q3, "Black Tie Gala"),
            (AnswerField::Q11, "Retired"),
            (AnswerField::Q12, "Weekday Mornings"),
            (AnswerField::Q14, "None"),
            (AnswerField::Q19, "Travel,Food & Wine,Cards / Games"),
            (AnswerField::Q20, "Printed Calendar"),
        ],
    );

    vec![(children, 30), (pets, 54), (retiree, 77)]
}

/// Inserts a few sample responses, skipping any whose email is already present.
pub async fn seed(pool: &PgPool, poll: &PollDefinition) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for (input, hours_ago) in seed_inputs() {
        let mut submission = validate_submission(poll, &input)
            .context("seed response does not match the poll definition")?;
        submission.created_at = Some(Utc::now() - Duration::hours(hours_ago));

        let existing: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM community_poll.submissions WHERE email = $1",
        )
        .bind(submission.email.as_deref())
        .fetch_one(pool)
        .await?
        .get("count");
        if existing > 0 {
            continue;
        }

        insert_submission(pool, &submission).await?;
        inserted += 1;
    }

    Ok(inserted)
}

/// Imports a CSV laid out like the export. Every row is validated before
/// anything is written, and all rows land in one transaction.
pub async fn import_csv(
    pool: &PgPool,
    poll: &PollDefinition,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let rows = export::read_csv(file)?;

    let mut submissions = Vec::with_capacity(rows.len());
    for row in rows {
        let mut submission = validate_submission(poll, &row.input)
            .with_context(|| format!("row {} was refused", row.row))?;
        submission.created_at = row.created_at;
        submissions.push(submission);
    }

    let mut tx = pool.begin().await?;
    for submission in &submissions {
        insert_submission(&mut *tx, submission).await?;
    }
    tx.commit().await?;

    info!("imported {} submissions from {}", submissions.len(), csv_path.display());
    Ok(submissions.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_statement_binds_every_column() {
        let sql = insert_sql();
        assert!(sql.starts_with("INSERT INTO community_poll.submissions (email, q0, q1,"));
        assert!(sql.contains("q20, q9_ages, q18_other, created_at)"));
        assert!(sql.contains("$24, COALESCE($25, NOW())"));
    }

    #[test]
    fn seed_responses_pass_validation() {
        let poll = PollDefinition::builtin().unwrap();
        for (input, _) in seed_inputs() {
            let submission = validate_submission(&poll, &input).unwrap();
            assert!(submission.email.is_some());
        }
    }
}
