/// Name prefix of the fan-out nodes the route compiler synthesizes
pub const FAN_OUT_PREFIX: &str = "hidden_brancher_";
/// Position step between consecutive stage references in a route
pub const POSITION_STEP: u32 = 10;
/// Offset of a fan-out from its source stage's position
pub const FAN_OUT_OFFSET: u32 = 5;
/// Priority given to tank placeholders (always drained first, never forwarded)
pub const PLACEHOLDER_PRIORITY: f64 = -1000.0;
/// Deepest allowed sub-graph nesting
pub const MAX_NESTING_DEPTH: usize = 50;
/// Section keys that are not stage parameters
pub const RESERVED_PARAMS: &[&str] = &["type"];
/// Name of the collecting sink `pump_data` attaches after the exit node
pub const PUMP_SINK_NAME: &str = "pump_sink";
/// Verb handled by the engine for every stage
pub const RESET_VERB: &str = "reset";
/// Prefix marking an environment reference in a dynamic graph
pub const ENV_MARKER: char = '%';
/// Default field a tank queue reads priorities from
pub const DEFAULT_PRIORITY_FIELD: &str = "seq_num";
/// Type name reported by synthesized fan-out nodes
pub const FAN_OUT_TYPE: &str = "fan_out";
/// Field name that maps onto a unit's own sequence number
pub const SEQ_NUM_FIELD: &str = "seq_num";
