use crate::db::models::ExamSection;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum SectionError {
    #[error("roll_start ({start}) must not be greater than roll_end ({end})")]
    InvalidRange { start: i64, end: i64 },
    #[error("Roll range {start}-{end} overlaps existing section {existing}")]
    Overlap { start: i64, end: i64, existing: String },
}

pub(crate) fn validate_range(start: i64, end: i64) -> Result<(), SectionError> {
    if start > end {
        return Err(SectionError::InvalidRange { start, end });
    }
    Ok(())
}

/// Inclusive ranges overlap when neither ends before the other starts.
pub(crate) fn find_overlap(
    sections: &[ExamSection],
    start: i64,
    end: i64,
) -> Option<&ExamSection> {
    sections.iter().find(|section| section.roll_start <= end && start <= section.roll_end)
}

pub(crate) fn check_new_range(
    sections: &[ExamSection],
    start: i64,
    end: i64,
) -> Result<(), SectionError> {
    validate_range(start, end)?;

    match find_overlap(sections, start, end) {
        Some(existing) => {
            Err(SectionError::Overlap { start, end, existing: display_name(existing) })
        }
        None => Ok(()),
    }
}

pub(crate) fn contains_roll(section: &ExamSection, roll_no: i64) -> bool {
    (section.roll_start..=section.roll_end).contains(&roll_no)
}

pub(crate) fn display_name(section: &ExamSection) -> String {
    match section.section_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}-{}", section.roll_start, section.roll_end),
    }
}
