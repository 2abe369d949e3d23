pub(crate) mod link;
pub(crate) mod transform_chain;
