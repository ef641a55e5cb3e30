pub mod actions;
pub mod connections;
pub mod deploy;
pub mod health;

#[cfg(test)]
pub(crate) mod test_support;
