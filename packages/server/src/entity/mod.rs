pub mod page;
pub mod page_block;
pub mod page_header;
