use std::collections::HashMap;
use std::io::{Read, Write};

use anyhow::{anyhow, Context};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::heatmap::parse_timestamp;
use crate::models::{AnswerField, ConditionalField, Submission, SubmissionInput};

fn header() -> Vec<&'static str> {
    let mut columns = vec!["id", "email"];
    columns.extend(AnswerField::ALL.iter().map(|field| field.column()));
    columns.extend(ConditionalField::ALL.iter().map(|field| field.column()));
    columns.push("created_at");
    columns
}

pub fn write_csv<W: Write>(writer: W, submissions: &[Submission]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header())?;

    for submission in submissions {
        let mut record = vec![
            submission.id.to_string(),
            submission.email.clone().unwrap_or_default(),
        ];
        record.extend(
            AnswerField::ALL
                .iter()
                .map(|&field| submission.answer(field).unwrap_or_default().to_string()),
        );
        record.extend(ConditionalField::ALL.iter().map(|&field| {
            submission
                .answers
                .conditional(field)
                .unwrap_or_default()
                .to_string()
        }));
        record.push(
            submission
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ImportedRow {
    /// 1-based data row number, header excluded.
    pub row: usize,
    pub input: SubmissionInput,
    pub created_at: Option<DateTime<Utc>>,
}

/// Reads rows laid out like [`write_csv`] output. Columns are matched by
/// header name; missing columns and empty cells mean "no answer".
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<ImportedRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: HashMap<String, usize> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_string(), index))
        .collect();

    let mut rows = Vec::new();
    for (offset, record) in reader.records().enumerate() {
        let row = offset + 1;
        let record = record.with_context(|| format!("failed to read CSV row {row}"))?;

        let cell = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|&index| record.get(index))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let mut input = SubmissionInput {
            email: cell("email"),
            ..SubmissionInput::default()
        };
        for field in AnswerField::ALL {
            *input.answer_mut(field) = cell(field.column());
        }
        for field in ConditionalField::ALL {
            *input.conditional_mut(field) = cell(field.column());
        }

        let created_at = match cell("created_at") {
            None => None,
            Some(value) => Some(
                parse_timestamp(&value)
                    .ok_or_else(|| anyhow!("row {row}: unparseable created_at {value:?}"))?,
            ),
        };

        rows.push(ImportedRow {
            row,
            input,
            created_at,
        });
    }

    Ok(rows)
}
