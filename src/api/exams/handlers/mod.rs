mod create;
mod list;
mod lock;
mod manage;
mod marks;
mod sections;

pub(super) use create::create_exam;
pub(super) use list::list_exams;
pub(super) use lock::{finalize_exam, unfinalize_exam};
pub(super) use manage::{delete_exam, get_exam};
pub(super) use marks::{export_marks, get_marks, save_marks};
pub(super) use sections::{create_section, delete_section, list_sections};
