//! Application-wide constants and default values
//!
//! Centralized location for all hard-coded values to improve maintainability

/// Save file constants
pub mod file {
    /// Version written into every save file
    pub const FORMAT_VERSION: &str = "1.0";

    /// Versions `load_from_file` accepts
    pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

    /// Creator string stored in save metadata
    pub const CREATOR: &str = "circuitry 0.1";
}

/// Port naming constants
pub mod port {
    /// First gate input
    pub const A: &str = "a";

    /// Second gate input
    pub const B: &str = "b";

    /// Third gate input (three-input gates)
    pub const C: &str = "c";

    /// Single input of one-input nodes and of PACKAGE-OUTPUT boundaries
    pub const IN: &str = "in";

    /// Single output of every node that has one
    pub const OUT: &str = "out";
}

/// Simulation constants
pub mod sim {
    /// Value read from an input port that has no live driver
    pub const UNDRIVEN: bool = false;

    /// Tick limit the CLI applies to `calc_bounded` unless told otherwise
    pub const DEFAULT_MAX_TICKS: usize = 10_000;
}
