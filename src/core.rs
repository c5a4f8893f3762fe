pub mod embed;
pub mod frame_loop;
