pub(crate) mod frame_graph;
pub(crate) mod frames;
