pub mod comparison;

pub use comparison::{
    CompareRequest, CompareResponse, ComparisonService, DiffRequest, DiffResponse,
};
