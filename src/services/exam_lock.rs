use serde::{Deserialize, Serialize};

use crate::db::models::{Exam, ExamSection};
use crate::services::access::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LockScope {
    #[default]
    Single,
    Global,
}

impl LockScope {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            LockScope::Single => "single",
            LockScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockAction {
    Finalize,
    Unfinalize,
}

impl LockAction {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            LockAction::Finalize => "finalize",
            LockAction::Unfinalize => "unfinalize",
        }
    }

    pub(crate) fn target_locked(self) -> bool {
        matches!(self, LockAction::Finalize)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum LockError {
    #[error("Exam {0} is already finalized")]
    AlreadyLocked(i64),
    #[error("Exam {0} is not finalized")]
    NotLocked(i64),
}

/// Precondition for anything that mutates marks.
pub(crate) fn ensure_unlocked(exam: &Exam) -> Result<(), LockError> {
    if exam.is_locked {
        return Err(LockError::AlreadyLocked(exam.id));
    }
    Ok(())
}

/// Single-scope transition check: repeating a transition is an error.
pub(crate) fn check_transition(exam: &Exam, action: LockAction) -> Result<(), LockError> {
    match (action, exam.is_locked) {
        (LockAction::Finalize, true) => Err(LockError::AlreadyLocked(exam.id)),
        (LockAction::Unfinalize, false) => Err(LockError::NotLocked(exam.id)),
        _ => Ok(()),
    }
}

/// Global-scope members that still need the transition, in ascending id order.
pub(crate) fn pending_members(members: &[Exam], action: LockAction) -> Vec<i64> {
    let mut ids: Vec<i64> = members
        .iter()
        .filter(|exam| exam.is_locked != action.target_locked())
        .map(|exam| exam.id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Unfinalize and any global transition are admin-only. A single exam may be finalized by its
/// owner or by a teacher holding one of its sections.
pub(crate) fn may_transition(
    actor: &Actor,
    exam: &Exam,
    sections: &[ExamSection],
    action: LockAction,
    scope: LockScope,
) -> bool {
    if actor.is_admin {
        return true;
    }

    match (action, scope) {
        (LockAction::Finalize, LockScope::Single) => {
            actor.owns_exam(exam) || actor.owns_any_section(sections)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures;

    fn locked(id: i64) -> Exam {
        let mut exam = fixtures::exam(id, Some(10));
        exam.is_locked = true;
        exam
    }

    #[test]
    fn lock_lifecycle_rejects_repeated_transitions() {
        let open = fixtures::exam(1, Some(10));
        assert!(check_transition(&open, LockAction::Finalize).is_ok());
        assert_eq!(
            check_transition(&open, LockAction::Unfinalize),
            Err(LockError::NotLocked(1))
        );

        let closed = locked(2);
        assert!(check_transition(&closed, LockAction::Unfinalize).is_ok());
        assert_eq!(
            check_transition(&closed, LockAction::Finalize),
            Err(LockError::AlreadyLocked(2))
        );
    }

    #[test]
    fn locked_exam_fails_mutation_precondition() {
        assert!(ensure_unlocked(&fixtures::exam(1, Some(10))).is_ok());
        assert_eq!(ensure_unlocked(&locked(3)), Err(LockError::AlreadyLocked(3)));
    }

    #[test]
    fn global_scope_skips_members_already_in_target_state() {
        let members = vec![locked(7), fixtures::exam(3, Some(11)), fixtures::exam(5, Some(12))];

        assert_eq!(pending_members(&members, LockAction::Finalize), vec![3, 5]);
        assert_eq!(pending_members(&members, LockAction::Unfinalize), vec![7]);
    }

    #[test]
    fn teachers_only_finalize_single_exams_they_are_part_of() {
        let exam = fixtures::exam(1, Some(10));
        let sections = vec![fixtures::section(4, 1, 21, 40, 11)];
        let owner = Actor { user_id: 10, is_admin: false };
        let section_teacher = Actor { user_id: 11, is_admin: false };
        let stranger = Actor { user_id: 12, is_admin: false };
        let admin = Actor { user_id: 1, is_admin: true };

        let finalize = |actor: &Actor, action, scope| {
            may_transition(actor, &exam, &sections, action, scope)
        };

        assert!(finalize(&owner, LockAction::Finalize, LockScope::Single));
        assert!(finalize(&section_teacher, LockAction::Finalize, LockScope::Single));
        assert!(!finalize(&stranger, LockAction::Finalize, LockScope::Single));
        assert!(!finalize(&owner, LockAction::Finalize, LockScope::Global));
        assert!(!finalize(&owner, LockAction::Unfinalize, LockScope::Single));
        assert!(finalize(&admin, LockAction::Unfinalize, LockScope::Global));
    }

    #[test]
    fn scope_parses_lowercase() {
        let scope: LockScope = serde_json::from_str("\"global\"").unwrap();
        assert_eq!(scope, LockScope::Global);
        assert_eq!(LockScope::default().as_str(), "single");
    }
}
