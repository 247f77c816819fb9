pub(crate) mod exams;
pub(crate) mod health;
pub(crate) mod marks;
pub(crate) mod marks_store;
pub(crate) mod questions;
pub(crate) mod sections;
pub(crate) mod students;
pub(crate) mod subjects;
pub(crate) mod users;
