pub mod observer;
pub mod optimizer;
pub mod particle;
pub mod stopping;
