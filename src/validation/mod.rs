//! Concrete screening inputs used before handing a candidate to the oracle

pub mod random;

pub use random::{
    RandomInputConfig, generate_edge_case_inputs, generate_random_inputs,
    generate_screening_inputs,
};
