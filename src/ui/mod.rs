pub mod map;
pub mod plots;
pub mod table;
pub mod viewdata;
pub mod windows;
