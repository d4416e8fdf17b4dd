pub mod block;
pub mod header;
pub mod page;
pub mod site;
