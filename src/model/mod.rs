pub mod attendance;
pub mod feedback;
pub mod profile;
pub mod role;
