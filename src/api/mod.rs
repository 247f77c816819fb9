pub(crate) mod admin;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod exports;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod subjects;
