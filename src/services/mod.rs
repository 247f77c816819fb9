pub(crate) mod access;
pub(crate) mod aggregate;
pub(crate) mod exam_lock;
pub(crate) mod export;
pub(crate) mod labels;
pub(crate) mod reconcile;
pub(crate) mod scoring;
pub(crate) mod sections;
