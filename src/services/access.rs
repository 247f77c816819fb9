use crate::db::models::{Exam, ExamSection, User};

/// Who is acting on an exam. Only the id and the admin bit matter to the marks services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Actor {
    pub(crate) user_id: i64,
    pub(crate) is_admin: bool,
}

impl Actor {
    pub(crate) fn from_user(user: &User) -> Self {
        Self { user_id: user.id, is_admin: user.is_admin() }
    }

    pub(crate) fn owns_exam(&self, exam: &Exam) -> bool {
        exam.created_by == Some(self.user_id)
    }

    pub(crate) fn owns_section(&self, section: &ExamSection) -> bool {
        section.teacher_id == self.user_id
    }

    pub(crate) fn owns_any_section(&self, sections: &[ExamSection]) -> bool {
        sections.iter().any(|section| self.owns_section(section))
    }

    /// Read access: admins, the exam owner and any teacher holding a section.
    pub(crate) fn can_view(&self, exam: &Exam, sections: &[ExamSection]) -> bool {
        self.is_admin || self.owns_exam(exam) || self.owns_any_section(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures;

    #[test]
    fn view_access_covers_owner_section_teacher_and_admin() {
        let exam = fixtures::exam(1, Some(10));
        let sections = vec![fixtures::section(5, 1, 1, 20, 11)];

        assert!(Actor { user_id: 10, is_admin: false }.can_view(&exam, &sections));
        assert!(Actor { user_id: 11, is_admin: false }.can_view(&exam, &sections));
        assert!(Actor { user_id: 99, is_admin: true }.can_view(&exam, &sections));
        assert!(!Actor { user_id: 12, is_admin: false }.can_view(&exam, &sections));
    }

    #[test]
    fn ownerless_exam_is_not_owned_by_anyone() {
        let exam = fixtures::exam(1, None);
        assert!(!Actor { user_id: 10, is_admin: false }.owns_exam(&exam));
    }
}
