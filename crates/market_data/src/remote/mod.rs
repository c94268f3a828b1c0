pub mod exness_client;

pub use exness_client::ExnessClient;
