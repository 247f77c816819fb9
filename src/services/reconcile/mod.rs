mod store;


use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::db::models::{Exam, ExamSection, Mark, RuleMap};
use crate::services::access::Actor;
use crate::services::{exam_lock, sections};

pub(crate) use store::{MarksStore, NewMark, StoreError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum MarksError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Exam is finalized; marks can no longer be changed")]
    Locked,
    #[error("failed to persist marks: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionInput {
    pub(crate) label: String,
    pub(crate) max_marks: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct StudentInput {
    pub(crate) roll_no: i64,
    pub(crate) name: Option<String>,
    pub(crate) absent: bool,
    /// Raw submitted values keyed by question label; parsed during validation.
    pub(crate) marks: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MarksSubmission {
    pub(crate) section_id: Option<i64>,
    pub(crate) questions: Vec<QuestionInput>,
    pub(crate) students: Vec<StudentInput>,
    pub(crate) question_rules: Option<RuleMap>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct SaveMarksSummary {
    pub(crate) created_questions: usize,
    pub(crate) updated_questions: usize,
    pub(crate) created_students: usize,
    pub(crate) updated_students: usize,
    pub(crate) created_marks: usize,
    pub(crate) updated_marks: usize,
    pub(crate) skipped_marks: usize,
}

struct ParsedStudent<'a> {
    roll_no: i64,
    name: Option<&'a str>,
    absent: bool,
    marks: Vec<(&'a str, Option<f64>)>,
}

/// Applies one submission to an exam.
///
/// All validation happens before the first store call, so a rejected submission never
/// touches the store. Write order is questions, then students, then marks; the marks step
/// relies on the ids produced by the question step.
pub(crate) async fn save_marks<S>(
    store: &mut S,
    exam: &Exam,
    exam_sections: &[ExamSection],
    actor: Actor,
    submission: &MarksSubmission,
) -> Result<SaveMarksSummary, MarksError>
where
    S: MarksStore + ?Sized,
{
    exam_lock::ensure_unlocked(exam).map_err(|_| MarksError::Locked)?;

    let section = resolve_section(exam, exam_sections, actor, submission.section_id)?;
    check_question_inputs(&submission.questions)?;
    let students = parse_students(&submission.students, section, actor)?;

    let mut summary = SaveMarksSummary::default();

    let question_ids = upsert_questions(store, exam.id, &submission.questions, &mut summary).await?;
    let student_ids = upsert_students(store, exam.id, &students, &mut summary).await?;

    let existing: HashMap<(i64, i64), Mark> = store
        .list_marks(exam.id)
        .await?
        .into_iter()
        .map(|mark| ((mark.student_id, mark.question_id), mark))
        .collect();
    let section_id = section.map(|section| section.id);

    for student in &students {
        let Some(&student_id) = student_ids.get(&student.roll_no) else {
            continue;
        };

        for &(label, value) in &student.marks {
            let Some(&question_id) = question_ids.get(label) else {
                tracing::warn!(
                    exam_id = exam.id,
                    roll_no = student.roll_no,
                    label,
                    "Skipping mark for unknown question label"
                );
                summary.skipped_marks += 1;
                continue;
            };

            let value = if student.absent { None } else { value };

            match existing.get(&(student_id, question_id)) {
                Some(mark) => {
                    if mark.marks != value || mark.section_id != section_id {
                        store.update_mark(mark.id, section_id, value).await?;
                        summary.updated_marks += 1;
                    }
                }
                None => {
                    store
                        .insert_mark(NewMark {
                            exam_id: exam.id,
                            student_id,
                            question_id,
                            section_id,
                            marks: value,
                        })
                        .await?;
                    summary.created_marks += 1;
                }
            }
        }
    }

    let students_count = store.list_students(exam.id).await?.len();
    let rules = merge_rules(&exam.question_rules.0, submission.question_rules.as_ref());
    store
        .update_exam_summary(exam.id, i32::try_from(students_count).unwrap_or(i32::MAX), &rules)
        .await?;

    Ok(summary)
}

fn resolve_section<'a>(
    exam: &Exam,
    exam_sections: &'a [ExamSection],
    actor: Actor,
    section_id: Option<i64>,
) -> Result<Option<&'a ExamSection>, MarksError> {
    if exam_sections.is_empty() {
        if let Some(section_id) = section_id {
            return Err(MarksError::NotFound(format!("Section {section_id} not found")));
        }
        if !actor.is_admin && !actor.owns_exam(exam) {
            return Err(MarksError::Forbidden("Not allowed to save marks for this exam".into()));
        }
        return Ok(None);
    }

    let Some(section_id) = section_id else {
        return Err(MarksError::Validation(
            "section_id is required for an exam with sections".into(),
        ));
    };

    let section = exam_sections
        .iter()
        .find(|section| section.id == section_id)
        .ok_or_else(|| MarksError::NotFound(format!("Section {section_id} not found")))?;

    if !actor.is_admin && !actor.owns_section(section) {
        return Err(MarksError::Forbidden(format!(
            "Not allowed to save marks for section {}",
            sections::display_name(section)
        )));
    }

    Ok(Some(section))
}

fn check_question_inputs(questions: &[QuestionInput]) -> Result<(), MarksError> {
    let mut seen = HashSet::new();
    for question in questions {
        if question.label.trim().is_empty() {
            return Err(MarksError::Validation("Question label must not be empty".into()));
        }
        if !question.max_marks.is_finite() || question.max_marks < 0.0 {
            return Err(MarksError::Validation(format!(
                "Invalid max_marks for question {}",
                question.label
            )));
        }
        if !seen.insert(question.label.as_str()) {
            return Err(MarksError::Validation(format!(
                "Duplicate question label {}",
                question.label
            )));
        }
    }
    Ok(())
}

fn parse_students<'a>(
    students: &'a [StudentInput],
    section: Option<&ExamSection>,
    actor: Actor,
) -> Result<Vec<ParsedStudent<'a>>, MarksError> {
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(students.len());

    for student in students {
        if !seen.insert(student.roll_no) {
            return Err(MarksError::Validation(format!(
                "Duplicate roll number {}",
                student.roll_no
            )));
        }

        if let Some(section) = section {
            if !sections::contains_roll(section, student.roll_no) {
                let message = format!(
                    "Roll number {} is outside section {} ({}-{})",
                    student.roll_no,
                    sections::display_name(section),
                    section.roll_start,
                    section.roll_end
                );
                return Err(if actor.is_admin {
                    MarksError::Validation(message)
                } else {
                    MarksError::Forbidden(message)
                });
            }
        }

        let mut labels = HashSet::new();
        let mut marks = Vec::with_capacity(student.marks.len());
        for (label, value) in &student.marks {
            let label = label.trim();
            if !labels.insert(label) {
                return Err(MarksError::Validation(format!(
                    "Duplicate mark for roll number {} question {label}",
                    student.roll_no
                )));
            }
            let value = parse_mark_value(value).ok_or_else(|| {
                MarksError::Validation(format!(
                    "Invalid mark for roll number {} question {label}",
                    student.roll_no
                ))
            })?;
            marks.push((label, value));
        }

        parsed.push(ParsedStudent {
            roll_no: student.roll_no,
            name: student.name.as_deref().map(str::trim).filter(|name| !name.is_empty()),
            absent: student.absent,
            marks,
        });
    }

    Ok(parsed)
}

/// `None` means the value is not a number. `Some(None)` is an empty cell.
fn parse_mark_value(value: &Value) -> Option<Option<f64>> {
    match value {
        Value::Null => Some(None),
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()).map(Some),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Some(None);
            }
            raw.parse::<f64>().ok().filter(|value| value.is_finite()).map(Some)
        }
        _ => None,
    }
}

async fn upsert_questions<S>(
    store: &mut S,
    exam_id: i64,
    questions: &[QuestionInput],
    summary: &mut SaveMarksSummary,
) -> Result<HashMap<String, i64>, MarksError>
where
    S: MarksStore + ?Sized,
{
    let existing = store.list_questions(exam_id).await?;
    let mut ids: HashMap<String, i64> =
        existing.iter().map(|question| (question.label.clone(), question.id)).collect();

    for (index, input) in questions.iter().enumerate() {
        let order = i32::try_from(index).unwrap_or(i32::MAX);

        match existing.iter().find(|question| question.label == input.label) {
            Some(question) => {
                if question.max_marks != input.max_marks || question.order != order {
                    store.update_question(question.id, input.max_marks, order).await?;
                    summary.updated_questions += 1;
                }
            }
            None => {
                let created =
                    store.insert_question(exam_id, &input.label, input.max_marks, order).await?;
                ids.insert(created.label, created.id);
                summary.created_questions += 1;
            }
        }
    }

    Ok(ids)
}

async fn upsert_students<S>(
    store: &mut S,
    exam_id: i64,
    students: &[ParsedStudent<'_>],
    summary: &mut SaveMarksSummary,
) -> Result<HashMap<i64, i64>, MarksError>
where
    S: MarksStore + ?Sized,
{
    let existing: HashMap<i64, _> = store
        .list_students(exam_id)
        .await?
        .into_iter()
        .map(|student| (student.roll_no, student))
        .collect();
    let mut ids = HashMap::with_capacity(students.len());

    for input in students {
        match existing.get(&input.roll_no) {
            Some(student) => {
                let name = input.name.or(student.name.as_deref());
                if student.absent != input.absent || student.name.as_deref() != name {
                    store.update_student(student.id, name, input.absent).await?;
                    summary.updated_students += 1;
                }
                ids.insert(input.roll_no, student.id);
            }
            None => {
                let created =
                    store.insert_student(exam_id, input.roll_no, input.name, input.absent).await?;
                ids.insert(input.roll_no, created.id);
                summary.created_students += 1;
            }
        }
    }

    Ok(ids)
}

/// Payload rules win key-by-key; a `null` rule removes the stored one.
pub(crate) fn merge_rules(stored: &RuleMap, incoming: Option<&RuleMap>) -> RuleMap {
    let mut merged = stored.clone();
    for (label, rule) in incoming.into_iter().flatten() {
        if rule.is_null() {
            merged.remove(label);
        } else {
            merged.insert(label.clone(), rule.clone());
        }
    }
    merged
}
