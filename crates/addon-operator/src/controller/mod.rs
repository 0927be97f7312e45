//! Controllers for Addon and AddonOperator resources

pub mod addon;
pub mod addon_operator;
