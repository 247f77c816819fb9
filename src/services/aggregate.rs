use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::models::{Exam, ExamSection, Mark, Question, RuleMap, Student};
use crate::repositories;

/// The six fields that make physical exam rows "the same exam". Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct LogicalExamKey {
    pub(crate) programme: String,
    pub(crate) subject_code: String,
    pub(crate) subject_name: String,
    pub(crate) exam_type: String,
    pub(crate) semester: i32,
    pub(crate) academic_year: String,
}

impl LogicalExamKey {
    pub(crate) fn of(exam: &Exam) -> Self {
        Self {
            programme: exam.programme.clone(),
            subject_code: exam.subject_code.clone(),
            subject_name: exam.subject_name.clone(),
            exam_type: exam.exam_type.clone(),
            semester: exam.semester,
            academic_year: exam.academic_year.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum GroupError {
    #[error("No exams found for the requested subject, type, semester and year")]
    NotFound,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Everything stored under one physical exam row.
#[derive(Debug, Clone)]
pub(crate) struct MemberData {
    pub(crate) exam: Exam,
    pub(crate) questions: Vec<Question>,
    pub(crate) students: Vec<Student>,
    pub(crate) marks: Vec<Mark>,
    pub(crate) sections: Vec<ExamSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MergedQuestion {
    pub(crate) label: String,
    pub(crate) max_marks: f64,
    pub(crate) order: i32,
}

/// `id` is the roll number; physical student ids differ per member exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MergedStudent {
    pub(crate) id: i64,
    pub(crate) roll_no: i64,
    pub(crate) name: Option<String>,
    pub(crate) absent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MergedMark {
    pub(crate) roll_no: i64,
    pub(crate) question_label: String,
    pub(crate) section_id: Option<i64>,
    pub(crate) marks: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ExamGroup {
    /// Metadata source for headers and filenames: the member with the lowest id.
    pub(crate) reference: Exam,
    pub(crate) member_ids: Vec<i64>,
    pub(crate) questions: Vec<MergedQuestion>,
    pub(crate) students: Vec<MergedStudent>,
    pub(crate) marks: Vec<MergedMark>,
    pub(crate) rules: RuleMap,
    pub(crate) sections: Vec<ExamSection>,
}

/// Merges member exams into one view.
///
/// Members are visited by ascending exam id and that order decides every collision: the first
/// question for a label, the first rule for a main label and the first mark for a
/// `(roll_no, label)` pair are kept. Absence is the exception and is OR'd across members.
pub(crate) fn merge_members(mut members: Vec<MemberData>) -> Option<ExamGroup> {
    members.sort_by_key(|member| member.exam.id);
    let reference = members.first()?.exam.clone();

    let mut questions: Vec<MergedQuestion> = Vec::new();
    let mut question_positions: HashMap<String, usize> = HashMap::new();
    let mut students: HashMap<i64, MergedStudent> = HashMap::new();
    let mut marks: Vec<MergedMark> = Vec::new();
    let mut seen_marks: HashSet<(i64, String)> = HashSet::new();
    let mut rules = RuleMap::new();
    let mut sections = Vec::new();
    let mut member_ids = Vec::with_capacity(members.len());

    for mut member in members {
        member_ids.push(member.exam.id);
        member.questions.sort_by_key(|question| (question.order, question.id));
        member.marks.sort_by_key(|mark| mark.id);

        for question in &member.questions {
            if question_positions.contains_key(&question.label) {
                continue;
            }
            question_positions.insert(question.label.clone(), questions.len());
            questions.push(MergedQuestion {
                label: question.label.clone(),
                max_marks: question.max_marks,
                order: i32::try_from(questions.len()).unwrap_or(i32::MAX),
            });
        }

        for student in &member.students {
            students
                .entry(student.roll_no)
                .and_modify(|merged| {
                    merged.absent |= student.absent;
                    if merged.name.is_none() {
                        merged.name = student.name.clone();
                    }
                })
                .or_insert_with(|| MergedStudent {
                    id: student.roll_no,
                    roll_no: student.roll_no,
                    name: student.name.clone(),
                    absent: student.absent,
                });
        }

        let rolls: HashMap<i64, i64> =
            member.students.iter().map(|student| (student.id, student.roll_no)).collect();
        let labels: HashMap<i64, &str> = member
            .questions
            .iter()
            .map(|question| (question.id, question.label.as_str()))
            .collect();

        for mark in &member.marks {
            let (Some(&roll_no), Some(&label)) =
                (rolls.get(&mark.student_id), labels.get(&mark.question_id))
            else {
                continue;
            };
            if !seen_marks.insert((roll_no, label.to_string())) {
                continue;
            }
            marks.push(MergedMark {
                roll_no,
                question_label: label.to_string(),
                section_id: mark.section_id,
                marks: mark.marks,
            });
        }

        for (label, rule) in member.exam.question_rules.0.iter() {
            if !rules.contains_key(label) {
                rules.insert(label.clone(), rule.clone());
            }
        }

        sections.extend(member.sections);
    }

    let mut students: Vec<MergedStudent> = students.into_values().collect();
    students.sort_by_key(|student| student.roll_no);
    marks.sort_by_key(|mark| {
        (mark.roll_no, question_positions.get(&mark.question_label).copied().unwrap_or(usize::MAX))
    });
    sections.sort_by_key(|section: &ExamSection| (section.roll_start, section.id));

    Some(ExamGroup { reference, member_ids, questions, students, marks, rules, sections })
}

pub(crate) async fn load_member(pool: &PgPool, exam: Exam) -> Result<MemberData, sqlx::Error> {
    let mut members = load_members(pool, vec![exam]).await?;
    members.pop().ok_or(sqlx::Error::RowNotFound)
}

/// Single-exam view through the same merge path as a logical group of one.
pub(crate) async fn load_single(pool: &PgPool, exam: Exam) -> Result<ExamGroup, GroupError> {
    let member = load_member(pool, exam).await?;
    merge_members(vec![member]).ok_or(GroupError::NotFound)
}

pub(crate) async fn load_group(
    pool: &PgPool,
    key: &LogicalExamKey,
) -> Result<ExamGroup, GroupError> {
    let exams = repositories::exams::list_by_logical_key(pool, key).await?;
    if exams.is_empty() {
        return Err(GroupError::NotFound);
    }

    let members = load_members(pool, exams).await?;
    merge_members(members).ok_or(GroupError::NotFound)
}

async fn load_members(pool: &PgPool, exams: Vec<Exam>) -> Result<Vec<MemberData>, sqlx::Error> {
    let ids: Vec<i64> = exams.iter().map(|exam| exam.id).collect();

    let mut questions = group_by_exam(
        repositories::questions::list_for_exams(pool, &ids).await?,
        |row| row.exam_id,
    );
    let mut students = group_by_exam(
        repositories::students::list_for_exams(pool, &ids).await?,
        |row| row.exam_id,
    );
    let mut marks =
        group_by_exam(repositories::marks::list_for_exams(pool, &ids).await?, |row| row.exam_id);
    let mut sections = group_by_exam(
        repositories::sections::list_for_exams(pool, &ids).await?,
        |row| row.exam_id,
    );

    Ok(exams
        .into_iter()
        .map(|exam| MemberData {
            questions: questions.remove(&exam.id).unwrap_or_default(),
            students: students.remove(&exam.id).unwrap_or_default(),
            marks: marks.remove(&exam.id).unwrap_or_default(),
            sections: sections.remove(&exam.id).unwrap_or_default(),
            exam,
        })
        .collect())
}

fn group_by_exam<T>(rows: Vec<T>, exam_id: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(exam_id(&row)).or_default().push(row);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures;
    use serde_json::json;

    fn member(exam: Exam) -> MemberData {
        MemberData {
            exam,
            questions: Vec::new(),
            students: Vec::new(),
            marks: Vec::new(),
            sections: Vec::new(),
        }
    }

    #[test]
    fn empty_group_has_no_view() {
        assert!(merge_members(Vec::new()).is_none());
    }

    #[test]
    fn absence_is_ored_across_members() {
        let mut a = member(fixtures::exam(1, Some(10)));
        a.questions = vec![fixtures::question(100, 1, "Q1", 0)];
        a.students = vec![fixtures::student(200, 1, 5, false)];
        a.marks = vec![fixtures::mark(300, 1, 200, 100, Some(5.0))];

        let mut b = member(fixtures::exam(2, Some(11)));
        b.questions = vec![fixtures::question(101, 2, "Q1", 0)];
        b.students = vec![fixtures::student(201, 2, 5, true)];
        b.marks = vec![fixtures::mark(301, 2, 201, 101, None)];

        let group = merge_members(vec![b, a]).expect("group");

        assert_eq!(group.member_ids, vec![1, 2]);
        assert_eq!(group.students.len(), 1);
        assert!(group.students[0].absent);
        assert_eq!(group.students[0].id, 5);
        assert_eq!(group.marks.len(), 1);
        // Lowest exam id wins the (roll_no, label) collision.
        assert_eq!(group.marks[0].marks, Some(5.0));
    }

    #[test]
    fn questions_merge_by_label_in_member_order() {
        let mut a = member(fixtures::exam(4, Some(10)));
        a.questions = vec![
            fixtures::question(11, 4, "Q2", 1),
            fixtures::question(10, 4, "Q1.A", 0),
        ];
        let mut b = member(fixtures::exam(9, Some(11)));
        b.questions = vec![
            fixtures::question(20, 9, "Q1.A", 0),
            fixtures::question(21, 9, "Q1.B", 1),
        ];
        b.questions[0].max_marks = 99.0;

        let group = merge_members(vec![a, b]).expect("group");
        let labels: Vec<&str> = group.questions.iter().map(|q| q.label.as_str()).collect();

        assert_eq!(labels, vec!["Q1.A", "Q2", "Q1.B"]);
        assert_eq!(group.questions[0].max_marks, 10.0);
        assert_eq!(group.questions[2].order, 2);
    }

    #[test]
    fn marks_are_rekeyed_by_roll_and_label() {
        let mut a = member(fixtures::exam(1, Some(10)));
        a.questions = vec![fixtures::question(7, 1, "Q1", 0), fixtures::question(8, 1, "Q2", 1)];
        a.students = vec![fixtures::student(30, 1, 12, false), fixtures::student(31, 1, 3, false)];
        a.marks = vec![
            fixtures::mark(1, 1, 30, 8, Some(4.0)),
            fixtures::mark(2, 1, 31, 7, Some(6.5)),
            fixtures::mark(3, 1, 30, 7, None),
        ];
        a.marks[0].section_id = Some(44);

        let group = merge_members(vec![a]).expect("group");
        let keyed: Vec<(i64, &str, Option<f64>)> = group
            .marks
            .iter()
            .map(|mark| (mark.roll_no, mark.question_label.as_str(), mark.marks))
            .collect();

        assert_eq!(
            keyed,
            vec![(3, "Q1", Some(6.5)), (12, "Q1", None), (12, "Q2", Some(4.0))]
        );
        assert_eq!(group.marks[2].section_id, Some(44));
        let rolls: Vec<i64> = group.students.iter().map(|student| student.roll_no).collect();
        assert_eq!(rolls, vec![3, 12]);
    }

    #[test]
    fn rules_are_first_seen_wins() {
        let mut first = fixtures::exam(1, Some(10));
        first.question_rules = sqlx::types::Json(fixtures::rules(json!({"Q1": {"minToCount": 1}})));
        let mut second = fixtures::exam(2, Some(11));
        second.question_rules = sqlx::types::Json(fixtures::rules(
            json!({"Q1": {"minToCount": 3}, "Q2": {"minToCount": 2}}),
        ));

        let group = merge_members(vec![member(second), member(first)]).expect("group");

        assert_eq!(
            serde_json::Value::Object(group.rules),
            json!({"Q1": {"minToCount": 1}, "Q2": {"minToCount": 2}})
        );
    }

    #[test]
    fn sections_from_all_members_are_collected_by_range() {
        let mut a = member(fixtures::exam(1, Some(10)));
        a.sections = vec![fixtures::section(8, 1, 21, 40, 11)];
        let mut b = member(fixtures::exam(2, Some(12)));
        b.sections = vec![fixtures::section(9, 2, 1, 20, 12)];

        let group = merge_members(vec![a, b]).expect("group");
        let ids: Vec<i64> = group.sections.iter().map(|section| section.id).collect();
        assert_eq!(ids, vec![9, 8]);
    }

    #[test]
    fn logical_key_uses_all_six_fields() {
        let a = fixtures::exam(1, Some(10));
        let mut b = fixtures::exam(2, Some(11));
        assert_eq!(LogicalExamKey::of(&a), LogicalExamKey::of(&b));

        b.subject_name = "data structures".to_string();
        assert_ne!(LogicalExamKey::of(&a), LogicalExamKey::of(&b));
    }
}
