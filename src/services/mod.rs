pub mod controller;
pub mod speech;
pub mod translate;

#[cfg(test)]
pub mod testkit;
