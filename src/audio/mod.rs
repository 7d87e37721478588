pub mod decode;
pub mod detect;
pub mod frame;
pub mod song;
pub mod spectrum;
