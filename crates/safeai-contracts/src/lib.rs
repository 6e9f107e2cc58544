//! Tool contract registry (spec component C5): validates tool requests
//! against declared accepted tags/fields before policy ever runs.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod model;
mod registry;

pub use model::{
    normalize_contracts, ToolContract, ToolContractDocument, ToolIoSurface, ToolSideEffects,
    ToolStores,
};
pub use registry::{ContractValidationResult, ToolContractRegistry};
