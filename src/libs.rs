pub mod assembler;
pub mod default_texture;
pub mod detector;
pub mod smart_arc;
pub mod texture;
pub mod uniform;
pub mod uniform_table;
