pub mod absence;
pub mod attendance;
pub mod committee;
pub mod meeting;
pub mod membership;
pub mod quorum;
pub mod timestamp;
pub mod user;
