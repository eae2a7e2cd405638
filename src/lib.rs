pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod content {
    pub mod frontmatter;
    pub mod mapper;
    pub mod migrate;
    pub mod models;
    pub mod schema;
    pub mod slug;
}
pub mod storage {
    pub mod client;
    pub mod github;
    pub mod memory;
}
pub mod api {
    pub mod content;
    pub mod errors;
    pub mod upload;
}
