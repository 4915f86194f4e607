pub(crate) mod doc;
pub(crate) mod model;
pub(crate) mod project;
pub(crate) mod storage;
