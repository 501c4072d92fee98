pub mod app;
pub mod capture;
pub mod cli;
pub mod domain;
pub mod notes;
pub mod speech;
pub mod ui;

#[cfg(test)]
pub mod test_support;
