pub mod combiner;
pub mod config;
pub mod error;
pub mod hyphenator;
pub mod metaheuristic;
pub mod patgen;
pub mod sampler;
pub mod scorer;
pub mod setting;
pub mod stats;
pub mod translate;
pub mod validator;
// cmd and reports are modules of the binary (main.rs)
