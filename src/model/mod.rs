pub mod collection;
pub mod page;
pub mod profile;
pub mod settings;
pub mod subsets;
pub mod table;
