pub mod conflicts;
pub mod restore_flow;
pub mod version_list;
