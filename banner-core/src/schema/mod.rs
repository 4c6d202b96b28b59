//! Banner schema module
//!
//! Domain types for banners and their versions, and the Cypher operations
//! that persist them in Neo4j.

pub mod banner;
pub mod types;

pub use banner::{delete_banner_by_id, get_banner, get_banners, insert_banner, update_banner_by_id};
pub use types::{
    format_timestamp, normalize_tags, parse_timestamp, Banner, BannerFilter, BannerUpdate,
    BannerVersion, Content, NewBanner, ResolveQuery, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};
