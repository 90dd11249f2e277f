
#[cfg(test)]
pub mod analysis_test;
