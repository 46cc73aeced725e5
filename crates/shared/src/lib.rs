pub mod assistant;
pub mod config;
mod config_env;
pub mod conversation;
pub mod invoice;
pub mod llm;
pub mod models;
pub mod repos;
#[cfg(test)]
pub(crate) mod test_support;
