pub(crate) mod reader;
pub(crate) mod string;
pub mod xml;
pub(crate) mod zip;
