mod common;

mod block;
mod header;
mod page;
