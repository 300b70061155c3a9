pub mod builder;
pub mod cycles;
pub mod trace;

pub use builder::{build_graph, DependencyEdge, DependencyGraph, GraphConfig};
pub use cycles::find_cycles;
pub use trace::{
    refine_call_edges, trace_downstream, CallEdge, EdgeKind, TraceResult, TracedDependent,
    DEFAULT_MAX_TRACE_DEPTH,
};
