mod assembler;
mod map_url;

pub use assembler::{ResponseAssembler, ResponseContext};
