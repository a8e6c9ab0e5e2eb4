pub mod classifier_client;
pub mod encode_service;
pub mod fs_service;
pub mod picker;
pub mod pipeline;
