pub mod bench;
pub mod driver;
pub mod runner;
pub mod store;

#[cfg(test)]
pub mod testing;
