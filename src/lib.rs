pub mod fetch;
pub mod loader;
pub mod model;
pub mod output;
pub mod parser;
pub mod scale;
pub mod time_filter;
pub mod traffic;
pub mod view;
pub mod viewport;
