use std::collections::HashMap;

use crate::db::models::{Exam, ExamSection};
use crate::services::aggregate::ExamGroup;
use crate::services::labels::LabelHierarchy;
use crate::services::scoring::{main_question_total, Score, ScoringRule};
use crate::services::sections;

const ROLL_COLUMN: &str = "Roll No";
const SECTION_COLUMN: &str = "Section";
const ABSENT_COLUMN: &str = "Absent";
const ABSENT_MARKER: &str = "AB";
const GRAND_TOTAL_COLUMN: &str = "Grand_Total";

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExportOptions {
    pub(crate) group_by_section: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportTable {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl ExportTable {
    /// Cell lookup by column name, mostly for assertions.
    pub(crate) fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.header.iter().position(|name| name == column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }
}

/// Lays out one row per student: roll number, optional section, an `Absent` marker column
/// when anyone is absent, each main question's sub-question cells followed by its total,
/// then the grand total.
pub(crate) fn build_table(group: &ExamGroup, options: ExportOptions) -> ExportTable {
    let hierarchy = LabelHierarchy::from_labels(group.questions.iter().map(|q| q.label.as_str()));
    let with_sections = !group.sections.is_empty();
    let with_absence = group.students.iter().any(|student| student.absent);

    let mut header = vec![ROLL_COLUMN.to_string()];
    if with_sections {
        header.push(SECTION_COLUMN.to_string());
    }
    if with_absence {
        header.push(ABSENT_COLUMN.to_string());
    }
    for main in hierarchy.mains() {
        header.extend(main.sub_labels.iter().cloned());
        header.push(format!("Total_{}", main.label));
    }
    header.push(GRAND_TOTAL_COLUMN.to_string());

    let mut values: HashMap<(i64, &str), Option<f64>> = HashMap::new();
    let mut student_sections: HashMap<i64, &ExamSection> = HashMap::new();
    for mark in &group.marks {
        values.insert((mark.roll_no, mark.question_label.as_str()), mark.marks);

        let Some(section_id) = mark.section_id else {
            continue;
        };
        if let Some(section) = group.sections.iter().find(|section| section.id == section_id) {
            student_sections.entry(mark.roll_no).or_insert(section);
        }
    }

    let mut students: Vec<_> = group.students.iter().collect();
    if options.group_by_section {
        students.sort_by_key(|student| {
            let section_start = student_sections
                .get(&student.roll_no)
                .map_or(i64::MAX, |section| section.roll_start);
            (section_start, student.roll_no)
        });
    }

    let rows = students
        .into_iter()
        .map(|student| {
            let mut row = Vec::with_capacity(header.len());
            row.push(student.roll_no.to_string());
            if with_sections {
                row.push(
                    student_sections
                        .get(&student.roll_no)
                        .map(|section| sections::display_name(section))
                        .unwrap_or_default(),
                );
            }
            if with_absence {
                row.push(if student.absent { ABSENT_MARKER } else { "" }.to_string());
            }

            let mut grand_total = 0.0;
            for main in hierarchy.mains() {
                let sub_values: Vec<Option<f64>> = main
                    .sub_labels
                    .iter()
                    .map(|label| {
                        values.get(&(student.roll_no, label.as_str())).copied().flatten()
                    })
                    .collect();
                row.extend(sub_values.iter().map(|value| format_cell(*value)));

                let rule = ScoringRule::for_main_label(&group.rules, &main.label);
                let total = main_question_total(&sub_values, rule);
                grand_total += total;
                row.push(Score::from_f64(total).to_string());
            }
            row.push(Score::from_f64(grand_total).to_string());
            row
        })
        .collect();

    ExportTable { header, rows }
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|value| Score::from_f64(value).to_string()).unwrap_or_default()
}

/// Metadata block, a blank line, then the table.
pub(crate) fn render_csv(exam: &Exam, institution_name: &str, table: &ExportTable) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 8);

    if !institution_name.trim().is_empty() {
        lines.push(metadata_line("Institution", institution_name.trim()));
    }
    lines.push(metadata_line("Programme", &exam.programme));
    lines.push(metadata_line("Academic Year", &exam.academic_year));
    lines.push(metadata_line(
        "Subject",
        &format!("{} - {}", exam.subject_code, exam.subject_name),
    ));
    lines.push(metadata_line("Semester", &exam.semester.to_string()));
    lines.push(metadata_line("Exam Type", &exam.exam_type));
    lines.push(String::new());

    lines.push(csv_row(&table.header));
    lines.extend(table.rows.iter().map(|row| csv_row(row)));

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

pub(crate) fn export_filename(exam: &Exam) -> String {
    let raw = format!(
        "{}_{}_Sem{}_{}.csv",
        exam.subject_code, exam.exam_type, exam.semester, exam.academic_year
    );
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn metadata_line(name: &str, value: &str) -> String {
    format!("{},{}", csv_quote(name), csv_quote(value))
}

fn csv_row(cells: &[String]) -> String {
    cells.iter().map(|cell| csv_quote(cell)).collect::<Vec<_>>().join(",")
}

fn csv_quote(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
