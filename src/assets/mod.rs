pub(crate) mod color;
pub(crate) mod cutout;
pub(crate) mod decode;
pub(crate) mod store;
